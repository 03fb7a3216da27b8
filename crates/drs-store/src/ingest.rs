//! Batched blob ingestion pipeline
//!
//! Streams a manifest of `<key> <source-path>` lines into the blob table.
//! Instead of committing per row, a transaction stays open until the
//! cumulative byte size of the batch crosses `commit_threshold`; it is then
//! committed and a fresh one is opened for the next batch. Missing sources
//! are skipped silently, oversize sources with a warning. Any other failure
//! aborts the run: the in-flight transaction is rolled back explicitly and
//! the batch bookkeeping is reported, while batches committed earlier stay
//! durable.

use crate::blobs;
use crate::config::IngestConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::Store;
use sqlx::{PgPool, Postgres, Transaction};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

/// One parsed manifest entry. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLine {
    pub key: String,
    pub location: PathBuf,
}

impl ManifestLine {
    /// Split a line into key and source location. The key is the first
    /// whitespace-separated token; the rest of the line, joined, is the
    /// location. A single-token line uses that token for both. Blank lines
    /// parse to `None`.
    pub fn parse(line: &str) -> Option<ManifestLine> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.split_once(char::is_whitespace) {
            Some((key, rest)) => Some(ManifestLine {
                key: key.to_string(),
                location: PathBuf::from(rest.trim_start()),
            }),
            None => Some(ManifestLine {
                key: trimmed.to_string(),
                location: PathBuf::from(trimmed),
            }),
        }
    }
}

/// State machine over the manifest stream: either no transaction is active,
/// or one batch transaction is open and accumulating rows.
struct ManifestIngest<'a> {
    pool: &'a PgPool,
    commit_threshold: u64,
    ignore_above: u64,
    tx: Option<Transaction<'static, Postgres>>,
    inserted: u64,
    batch_bytes: u64,
    total_bytes: u64,
    pending: Vec<ManifestLine>,
}

impl<'a> ManifestIngest<'a> {
    fn new(pool: &'a PgPool, options: &IngestConfig) -> Self {
        Self {
            pool,
            commit_threshold: options.commit_threshold,
            ignore_above: options.ignore_above,
            tx: None,
            inserted: 0,
            batch_bytes: 0,
            total_bytes: 0,
            pending: Vec::new(),
        }
    }

    async fn run(&mut self, manifest: &Path) -> StoreResult<u64> {
        let file = fs::File::open(manifest).await?;
        let mut lines = BufReader::new(file).lines();

        while let Some(line) = lines.next_line().await? {
            self.process_line(&line).await?;
        }

        // Commit the final, partially filled batch exactly once.
        self.commit_batch().await?;

        Ok(self.inserted)
    }

    async fn process_line(&mut self, line: &str) -> StoreResult<()> {
        let Some(entry) = ManifestLine::parse(line) else {
            return Ok(());
        };

        let meta = match fs::metadata(&entry.location).await {
            Ok(meta) => meta,
            Err(_) => {
                debug!(
                    location = %entry.location.display(),
                    "Skipping manifest line, source does not exist"
                );
                return Ok(());
            },
        };

        let size = meta.len();
        if size > self.ignore_above {
            warn!(
                location = %entry.location.display(),
                size,
                "Ignoring file because it is too large"
            );
            return Ok(());
        }

        let value = fs::read(&entry.location).await?;

        if self.tx.is_none() {
            self.tx = Some(self.pool.begin().await?);
        }
        if let Some(tx) = self.tx.as_mut() {
            let rows = blobs::insert(&mut **tx, &entry.key, &value).await?;
            if rows > 0 {
                self.inserted += 1;
            }
        }

        self.batch_bytes += size;
        self.total_bytes += size;
        self.pending.push(entry);

        if self.batch_bytes > self.commit_threshold {
            self.commit_batch().await?;
        }

        Ok(())
    }

    async fn commit_batch(&mut self) -> StoreResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
            info!(
                files = self.inserted,
                batch_bytes = self.batch_bytes,
                total_bytes = self.total_bytes,
                "Committed ingest batch"
            );
            self.batch_bytes = 0;
            self.pending.clear();
        }
        Ok(())
    }

    /// Report the batch bookkeeping, discard the in-flight transaction
    /// deterministically, and wrap the source error.
    async fn abort(&mut self, source: StoreError) -> StoreError {
        error!(
            inserted = self.inserted,
            batch_bytes = self.batch_bytes,
            total_bytes = self.total_bytes,
            pending = self.pending.len(),
            error = %source,
            "Ingestion failed"
        );
        if let Some(tx) = self.tx.take() {
            if let Err(e) = tx.rollback().await {
                warn!(error = %e, "Failed to roll back in-flight ingest transaction");
            }
        }
        StoreError::IngestionAborted {
            inserted: self.inserted,
            batch_bytes: self.batch_bytes,
            total_bytes: self.total_bytes,
            source: Box::new(source),
        }
    }
}

impl Store {
    /// Bulk-load every manifest entry into the blob table.
    ///
    /// Returns the number of files actually inserted; sources that are
    /// missing, oversize, or already present under their key do not count.
    pub async fn ingest_manifest(
        &self,
        manifest: impl AsRef<Path>,
        options: &IngestConfig,
    ) -> StoreResult<u64> {
        let manifest = manifest.as_ref();
        info!(
            manifest = %manifest.display(),
            commit_threshold = options.commit_threshold,
            ignore_above = options.ignore_above,
            "Starting blob ingest"
        );

        let mut ingest = ManifestIngest::new(self.pool(), options);
        match ingest.run(manifest).await {
            Ok(count) => {
                info!(
                    files = count,
                    total_bytes = ingest.total_bytes,
                    "Done inserting binary files"
                );
                Ok(count)
            },
            Err(e) => Err(ingest.abort(e).await),
        }
    }
}
