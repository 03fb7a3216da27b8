//! List the key/value bookkeeping table

use anyhow::Result;
use drs_store::Store;

pub async fn run(store: &Store) -> Result<()> {
    println!("Key, Value from the storage:");
    println!("{}", "-".repeat(80));

    for entry in store.kv_list().await? {
        println!("{} {}", entry.key, entry.value.as_deref().unwrap_or(""));
    }

    Ok(())
}
