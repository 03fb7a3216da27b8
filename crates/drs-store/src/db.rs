//! Connection pool creation and schema bootstrap

use crate::config::DatabaseConfig;
use crate::error::StoreResult;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Embedded schema migrations (`migrations/` in this crate).
///
/// Applied automatically by `#[sqlx::test]`; operators run them once at
/// deploy time via `MIGRATOR.run(&pool)`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

pub async fn create_pool(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> StoreResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
