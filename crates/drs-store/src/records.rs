//! Record store operations
//!
//! One row per business key; each payload field carries its own last-update
//! timestamp and every mutation is audited in the change log within the same
//! transaction. Downstream pipelines report back through `mark_processed`.

use crate::changelog;
use crate::error::{is_unique_violation, StoreError, StoreResult};
use crate::fields::{
    FieldType, Payload, PipelineType, CHANGE_LOG_SENTINEL, DIAGNOSTIC_COLUMNS, FIELDS, PIPELINES,
};
use crate::store::Store;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error};

/// Full state of one record as of a point in time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecordSnapshot {
    pub key: String,
    pub metadata: Option<String>,
    pub metadata_updated: Option<DateTime<Utc>>,
    pub secondary_metadata: Option<String>,
    pub secondary_metadata_updated: Option<DateTime<Utc>>,
    pub external_claims: Option<String>,
    pub external_claims_updated: Option<DateTime<Utc>>,
    pub full_text: Option<String>,
    pub full_text_updated: Option<DateTime<Utc>>,
    pub metrics: Option<String>,
    pub metrics_updated: Option<DateTime<Utc>>,
    pub augmentation: Option<String>,
    pub augmentation_updated: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
    pub processed: Option<DateTime<Utc>>,
    pub solr_processed: Option<DateTime<Utc>>,
    pub solr_checksum: Option<String>,
    pub metrics_processed: Option<DateTime<Utc>>,
    pub metrics_checksum: Option<String>,
    pub links_processed: Option<DateTime<Utc>>,
    pub links_checksum: Option<String>,
    pub status: Option<String>,
}

impl RecordSnapshot {
    /// Payload of the given field, if populated (and selected by the query).
    pub fn payload(&self, field: FieldType) -> Option<&str> {
        match field {
            FieldType::Metadata => self.metadata.as_deref(),
            FieldType::SecondaryMetadata => self.secondary_metadata.as_deref(),
            FieldType::ExternalClaims => self.external_claims.as_deref(),
            FieldType::FullText => self.full_text.as_deref(),
            FieldType::Metrics => self.metrics.as_deref(),
            FieldType::Augmentation => self.augmentation.as_deref(),
        }
    }

    /// Last-update timestamp of the given field.
    pub fn field_updated(&self, field: FieldType) -> Option<DateTime<Utc>> {
        match field {
            FieldType::Metadata => self.metadata_updated,
            FieldType::SecondaryMetadata => self.secondary_metadata_updated,
            FieldType::ExternalClaims => self.external_claims_updated,
            FieldType::FullText => self.full_text_updated,
            FieldType::Metrics => self.metrics_updated,
            FieldType::Augmentation => self.augmentation_updated,
        }
    }
}

/// SELECT clause over the static field table. Payload columns outside the
/// requested subset are replaced by typed NULLs so large bodies are never
/// transferred when unneeded.
fn snapshot_select(fields: Option<&[FieldType]>) -> String {
    let mut columns: Vec<String> = Vec::with_capacity(DIAGNOSTIC_COLUMNS.len());
    columns.push("key".to_string());
    for d in FIELDS {
        let wanted = fields.map_or(true, |fs| fs.contains(&d.field));
        if wanted {
            columns.push(d.payload_column.to_string());
        } else {
            columns.push(format!("NULL::text AS {}", d.payload_column));
        }
        columns.push(d.updated_column.to_string());
    }
    columns.push("created".to_string());
    columns.push("updated".to_string());
    columns.push("processed".to_string());
    for p in PIPELINES {
        columns.push(p.processed_column.to_string());
        columns.push(p.checksum_column.to_string());
    }
    columns.push("status".to_string());
    format!("SELECT {} FROM records", columns.join(", "))
}

fn conflict_or(err: sqlx::Error, key: &str, field: FieldType) -> StoreError {
    if is_unique_violation(&err) {
        error!(key = %key, field = %field, "Constraint violation while updating record");
        StoreError::StorageConflict { key: key.to_string(), field }
    } else {
        StoreError::Database(err)
    }
}

impl Store {
    /// Overwrite one payload field of the record identified by `key`,
    /// creating the record on first write.
    ///
    /// The field's timestamp and the overall `updated` timestamp are set to
    /// the same instant, and exactly one change-log entry is appended, all
    /// in one transaction. A unique-constraint race with a concurrent first
    /// writer rolls back and surfaces [`StoreError::StorageConflict`].
    ///
    /// Returns the full record snapshot as of the commit.
    pub async fn update_field(
        &self,
        key: &str,
        field: FieldType,
        payload: impl Into<Payload>,
    ) -> StoreResult<RecordSnapshot> {
        let desc = field.descriptor();
        let stored = payload.into().into_storage()?;
        let now = Utc::now();

        let mut tx = self.pool().begin().await?;

        let select_sql =
            format!("SELECT {} FROM records WHERE key = $1 FOR UPDATE", desc.payload_column);
        let existing: Option<Option<String>> = sqlx::query_scalar(&select_sql)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;

        match &existing {
            Some(_) => {
                let update_sql = format!(
                    "UPDATE records SET {} = $2, {} = $3, updated = $3 WHERE key = $1",
                    desc.payload_column, desc.updated_column
                );
                sqlx::query(&update_sql)
                    .bind(key)
                    .bind(&stored)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
            },
            None => {
                let insert_sql = format!(
                    "INSERT INTO records (key, {}, {}, updated) VALUES ($1, $2, $3, $3)",
                    desc.payload_column, desc.updated_column
                );
                sqlx::query(&insert_sql)
                    .bind(key)
                    .bind(&stored)
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| conflict_or(e, key, field))?;
            },
        }

        // Large fields are not duplicated into the audit trail; the log
        // records a fixed sentinel instead of the previous payload.
        let old_value = if desc.log_previous_value {
            existing.flatten()
        } else {
            Some(CHANGE_LOG_SENTINEL.to_string())
        };
        changelog::append(&mut *tx, key, desc.name, old_value.as_deref()).await?;

        let snapshot_sql = format!("{} WHERE key = $1", snapshot_select(None));
        let snapshot: RecordSnapshot = sqlx::query_as(&snapshot_sql)
            .bind(key)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await.map_err(|e| conflict_or(e, key, field))?;

        Ok(snapshot)
    }

    /// Load one record, or `None` if no record exists for `key`.
    ///
    /// `fields` restricts which payload columns are transferred; timestamps
    /// and pipeline state are always loaded.
    pub async fn get_record(
        &self,
        key: &str,
        fields: Option<&[FieldType]>,
    ) -> StoreResult<Option<RecordSnapshot>> {
        let sql = format!("{} WHERE key = $1", snapshot_select(fields));
        let snapshot = sqlx::query_as(&sql).bind(key).fetch_optional(self.pool()).await?;
        Ok(snapshot)
    }

    /// Load a batch of records. Keys with no record are silently omitted.
    pub async fn get_records(
        &self,
        keys: &[String],
        fields: Option<&[FieldType]>,
    ) -> StoreResult<Vec<RecordSnapshot>> {
        let sql = format!("{} WHERE key = ANY($1)", snapshot_select(fields));
        let snapshots = sqlx::query_as(&sql).bind(keys).fetch_all(self.pool()).await?;
        Ok(snapshots)
    }

    /// Stamp the given pipeline's processed timestamp (and checksum) on
    /// every record in `keys`, optionally overwriting the shared status.
    ///
    /// `checksums`, when given, must be parallel to `keys`; when absent the
    /// checksum column is cleared for this call. Each key is applied as its
    /// own unit of work: a failure on one key does not undo updates already
    /// applied for prior keys.
    pub async fn mark_processed(
        &self,
        keys: &[String],
        pipeline: PipelineType,
        checksums: Option<&[String]>,
        status: Option<&str>,
    ) -> StoreResult<()> {
        // An empty key set would otherwise match the whole table.
        if keys.is_empty() {
            return Ok(());
        }

        if let Some(checksums) = checksums {
            if checksums.len() != keys.len() {
                return Err(StoreError::ChecksumCountMismatch {
                    keys: keys.len(),
                    checksums: checksums.len(),
                });
            }
        }

        let desc = pipeline.descriptor();
        let now = Utc::now();
        debug!(now = %now, num_keys = keys.len(), pipeline = %pipeline, "Marking records as processed");

        let sql = format!(
            "UPDATE records SET processed = $2, {} = $2, {} = $3, \
             status = COALESCE($4, status) WHERE key = $1",
            desc.processed_column, desc.checksum_column
        );

        for (i, key) in keys.iter().enumerate() {
            let checksum = checksums.map(|c| c[i].as_str());
            sqlx::query(&sql)
                .bind(key)
                .bind(now)
                .bind(checksum)
                .bind(status)
                .execute(self.pool())
                .await?;
        }

        Ok(())
    }

    /// First `limit` records by key, for diagnostics.
    pub async fn sample_records(&self, limit: i64) -> StoreResult<Vec<RecordSnapshot>> {
        let sql = format!("{} ORDER BY key LIMIT $1", snapshot_select(None));
        let snapshots = sqlx::query_as(&sql).bind(limit).fetch_all(self.pool()).await?;
        Ok(snapshots)
    }

    /// Count records with a non-NULL value in `column`.
    ///
    /// Only columns from the static [`DIAGNOSTIC_COLUMNS`] table are
    /// accepted; the record row's attribute set is a closed contract.
    pub async fn count_populated(&self, column: &str) -> StoreResult<i64> {
        if !DIAGNOSTIC_COLUMNS.contains(&column) {
            return Err(StoreError::UnknownColumn(column.to_string()));
        }
        let sql = format!("SELECT COUNT({}) FROM records", column);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(self.pool()).await?;
        Ok(count)
    }
}
