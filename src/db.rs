//! PostgreSQL pool and embedded schema migrations for [`crate::store::PgStore`].

use std::time::Duration;

use sqlx::{Pool, Postgres, postgres::PgPoolOptions};

pub type DbPool = Pool<Postgres>;

/// Connect to PostgreSQL.
///
/// Waiting for a pooled connection is capped so a saturated pool surfaces as
/// an error instead of stalling a request that already holds account locks.
///
/// # Errors
///
/// Fails if the URL is malformed or the server refuses the connection.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Apply pending migrations (wallets, savings goals, ledger entries, API keys).
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
