//! Run the batched blob ingestion pipeline over a manifest

use anyhow::Result;
use drs_store::{IngestConfig, Store, StoreConfig};
use std::path::Path;
use tracing::info;

pub async fn run(
    store: &Store,
    config: &StoreConfig,
    manifest: &Path,
    commit_threshold: Option<u64>,
    ignore_above: Option<u64>,
    truncate: bool,
) -> Result<()> {
    if truncate {
        store.truncate_blobs().await?;
    }

    let options = IngestConfig {
        commit_threshold: commit_threshold.unwrap_or(config.ingest.commit_threshold),
        ignore_above: ignore_above.unwrap_or(config.ingest.ignore_above),
    };

    info!(manifest = %manifest.display(), "Starting ingest");
    let inserted = store.ingest_manifest(manifest, &options).await?;
    println!("Inserted {} binary files", inserted);

    Ok(())
}
