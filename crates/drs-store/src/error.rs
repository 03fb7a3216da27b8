//! Store-specific error types

use crate::fields::FieldType;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by the record store, blob store, and ingestion pipeline
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(
        "Invalid field type '{0}', must be one of: metadata, secondary-metadata, \
         external-claims, full-text, metrics, augmentation"
    )]
    InvalidFieldType(String),

    #[error("Invalid pipeline type '{0}', must be solr, metrics or links")]
    InvalidPipelineType(String),

    #[error("Storage conflict while writing {field} for record '{key}'")]
    StorageConflict { key: String, field: FieldType },

    #[error("Checksum list length {checksums} does not match key list length {keys}")]
    ChecksumCountMismatch { keys: usize, checksums: usize },

    #[error("Unknown diagnostic column: {0}")]
    UnknownColumn(String),

    #[error(
        "Ingestion aborted after {inserted} inserts, batch_bytes={batch_bytes}, \
         total_bytes={total_bytes}: {source}"
    )]
    IngestionAborted {
        inserted: u64,
        batch_bytes: u64,
        total_bytes: u64,
        #[source]
        source: Box<StoreError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// True when the error is a commit-time unique constraint violation,
/// i.e. a concurrent writer won the race for the same key.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
        },
        _ => false,
    }
}
