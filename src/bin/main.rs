use dotenv::dotenv;

use fast_microblog::{app::*, error::*};

fn main() -> Result<()> {
  dotenv().ok();
  env_logger::init();

  let cli = clap::App::new("fast-microblog")
    .about("Microblogging API server")
    .arg(clap::Arg::new("config")
      .short('c')
      .long("config")
      .takes_value(true)
      .help("Config file to use instead of conf/{RUN_MODE}"))
    .subcommand(clap::App::new("serve")
      .about("Run the API server"))
    .get_matches();

  let config = AppConfig::new_clap(&cli)?;

  match cli.subcommand_name() {
    // default to 'serve' command.
    _ => serve::execute(config)?,
  }
  log::info!("Main finished");
  Ok(())
}
