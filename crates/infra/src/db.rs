//! Postgres connection pool construction.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::DatabaseConfig;
use crate::store::StoreError;

/// Connect a pool sized and timed out per `config`.
///
/// Broken connections are detected on acquire and replaced by the pool.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .test_before_acquire(true)
        .connect(&config.url)
        .await
        .map_err(|e| StoreError::Unavailable(format!("failed to connect to Postgres: {e}")))
}
