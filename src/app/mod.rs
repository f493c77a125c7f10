mod config;
pub use config::*;

pub mod commands;
pub use commands::*;
