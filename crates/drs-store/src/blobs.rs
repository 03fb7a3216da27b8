//! Blob store primitives
//!
//! A flat key to binary-value table fed by the batched ingestion pipeline.
//! Inserts are first-writer-wins; a duplicate key is a no-op rather than an
//! overwrite.

use crate::error::StoreResult;
use crate::store::Store;
use sqlx::PgExecutor;
use tracing::info;

/// Conflict-tolerant insert. Returns the number of rows actually written
/// (0 when the key already exists).
pub(crate) async fn insert<'e, E>(executor: E, key: &str, value: &[u8]) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("INSERT INTO blobs (key, value) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(key)
        .bind(value)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

impl Store {
    /// Fetch a stored blob by key.
    pub async fn get_blob(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let value = sqlx::query_scalar("SELECT value FROM blobs WHERE key = $1")
            .bind(key)
            .fetch_optional(self.pool())
            .await?;
        Ok(value)
    }

    /// Number of blobs currently stored.
    pub async fn count_blobs(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blobs")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    /// Empty the blob table before a fresh bulk load.
    pub async fn truncate_blobs(&self) -> StoreResult<()> {
        sqlx::query("TRUNCATE TABLE blobs").execute(self.pool()).await?;
        info!("Truncated tables: blobs");
        Ok(())
    }
}
