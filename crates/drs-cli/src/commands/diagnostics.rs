//! Storage diagnostics
//!
//! Prints record snapshots as JSON followed by population counts for every
//! column in the closed diagnostic column table.

use anyhow::Result;
use drs_store::{Store, DIAGNOSTIC_COLUMNS};

pub async fn run(store: &Store, keys: &[String]) -> Result<()> {
    store.health_check().await?;

    let snapshots = if keys.is_empty() {
        println!("Printing 3 sampled records (if any)");
        store.sample_records(3).await?
    } else {
        store.get_records(keys, None).await?
    };

    for snapshot in &snapshots {
        println!("stored by us: {}", snapshot.key);
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        println!("{}", "-".repeat(80));
    }

    for column in DIAGNOSTIC_COLUMNS {
        let count = store.count_populated(column).await?;
        println!("# of {}: {}", column, count);
    }

    Ok(())
}
