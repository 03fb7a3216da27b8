//! Append-only change log
//!
//! One row per field mutation, written only by `update_field` inside the
//! same transaction as the record write. This module exposes append alone;
//! querying the audit trail is a collaborator concern, not part of the
//! storage core.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, Row};

/// A single audit entry: which field of which record changed, and what the
/// previous value was (or the `not-stored` sentinel for large fields).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChangeLogEntry {
    pub id: i64,
    pub key: String,
    pub field_type: String,
    pub old_value: Option<String>,
    pub created: DateTime<Utc>,
}

/// Append one entry, returning its id.
pub(crate) async fn append<'e, E>(
    executor: E,
    key: &str,
    field_type: &str,
    old_value: Option<&str>,
) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query(
        r#"
        INSERT INTO change_log (key, field_type, old_value)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(key)
    .bind(field_type)
    .bind(old_value)
    .fetch_one(executor)
    .await?;

    row.try_get("id")
}
