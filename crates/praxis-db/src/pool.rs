//! Database connection pool

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Database connection pool type alias
pub type DbPool = PgPool;

/// Create a connection pool sized for the billing engine.
///
/// Quota checks hold a per-user advisory lock for the length of one small
/// transaction, so the pool stays modest and bounds the acquire wait rather
/// than letting lock waiters pile up.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}
