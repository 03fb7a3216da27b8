//! The store handle
//!
//! A `Store` wraps the connection pool and is constructed once at process
//! start, then passed by reference to every caller. There is no process-wide
//! singleton; ownership of the handle is explicit.

use crate::config::StoreConfig;
use crate::db;
use crate::error::StoreResult;
use sqlx::PgPool;

/// Handle to the record store, blob store, and ingestion pipeline.
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pool from configuration and wrap it.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let pool = db::create_pool(&config.database).await?;
        Ok(Self::new(pool))
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Verify the backing database is reachable.
    pub async fn health_check(&self) -> StoreResult<()> {
        db::health_check(&self.pool).await
    }
}
