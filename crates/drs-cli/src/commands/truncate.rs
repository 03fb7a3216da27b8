//! Truncate the blob store

use anyhow::Result;
use drs_store::Store;

pub async fn run(store: &Store) -> Result<()> {
    store.truncate_blobs().await?;
    println!("Blob store truncated");
    Ok(())
}
