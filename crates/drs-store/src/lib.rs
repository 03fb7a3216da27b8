//! DRS Store
//!
//! Versioned per-record storage with an append-only change log, plus a
//! batched blob-ingestion pipeline, backed by Postgres.
//!
//! The record store keeps one row per business key with independently
//! updatable payload fields, each carrying its own last-update timestamp.
//! Downstream pipelines (solr, metrics, links) report completion through
//! [`Store::mark_processed`]. The blob pipeline bulk-loads binary files
//! from a manifest, committing by cumulative byte size rather than per row.
//!
//! # Example
//!
//! ```no_run
//! use drs_store::{FieldType, Store, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), drs_store::StoreError> {
//!     let config = StoreConfig::load()?;
//!     let store = Store::connect(&config).await?;
//!
//!     let snapshot = store
//!         .update_field("2021A&A...123..456B", FieldType::Metadata, "{\"title\": \"...\"}")
//!         .await?;
//!     println!("updated at {:?}", snapshot.metadata_updated);
//!     Ok(())
//! }
//! ```

pub mod blobs;
pub mod changelog;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod ingest;
pub mod kv;
pub mod records;
pub mod store;

// Re-export the public surface
pub use changelog::ChangeLogEntry;
pub use config::{IngestConfig, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use fields::{
    FieldDescriptor, FieldType, Payload, PipelineDescriptor, PipelineType, CHANGE_LOG_SENTINEL,
    DIAGNOSTIC_COLUMNS, FIELDS, PIPELINES,
};
pub use ingest::ManifestLine;
pub use kv::KeyValue;
pub use records::RecordSnapshot;
pub use store::Store;
