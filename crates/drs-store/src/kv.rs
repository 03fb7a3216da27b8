//! Key/value bookkeeping table
//!
//! Workers park small markers here (last-run timestamps and similar); the
//! CLI lists them for operators.

use crate::error::StoreResult;
use crate::store::Store;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

impl Store {
    pub async fn kv_get(&self, key: &str) -> StoreResult<Option<String>> {
        let value: Option<Option<String>> =
            sqlx::query_scalar("SELECT value FROM key_value WHERE key = $1")
                .bind(key)
                .fetch_optional(self.pool())
                .await?;
        Ok(value.flatten())
    }

    pub async fn kv_put(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO key_value (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// All bookkeeping entries, ordered by key.
    pub async fn kv_list(&self) -> StoreResult<Vec<KeyValue>> {
        let entries = sqlx::query_as("SELECT key, value FROM key_value ORDER BY key")
            .fetch_all(self.pool())
            .await?;
        Ok(entries)
    }
}
