use std::sync::{Mutex, MutexGuard};

use lazy_static::lazy_static;

use tokio_postgres::NoTls;

lazy_static! {
  // The schema reset below conflicts with concurrently running tests.
  static ref DB_LOCK: Mutex<()> = Mutex::new(());
}

pub fn db_url() -> String {
  std::env::var("TEST_DB_URL")
    .expect("TEST_DB_URL must point at a scratch database")
}

fn lock_db() -> MutexGuard<'static, ()> {
  DB_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Drop and recreate all tables.  The returned client stays around for
/// raw fixture queries and assertions.
async fn reset_db(url: &str) -> tokio_postgres::Client {
  let (client, conn) = tokio_postgres::connect(url, NoTls).await
    .expect("failed to connect to TEST_DB_URL");
  actix_rt::spawn(async move {
    let _ = conn.await;
  });
  client.batch_execute(include_str!("../../sql/schema.sql")).await
    .expect("failed to load sql/schema.sql");
  client
}

pub async fn setup() -> (MutexGuard<'static, ()>, tokio_postgres::Client, String) {
  std::env::set_var("JWT_SECRET", "integration-test-secret");
  let guard = lock_db();
  let url = db_url();
  let client = reset_db(&url).await;
  (guard, client, url)
}
