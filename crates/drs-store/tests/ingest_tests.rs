//! Blob ingestion integration tests using SQLx
//!
//! Manifests and source files are staged in a temp directory; each test
//! drives the batched pipeline end-to-end against a migrated database.

use drs_store::{IngestConfig, Store, StoreError};
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn write_manifest(dir: &TempDir, lines: &[String]) -> PathBuf {
    write_file(dir, "manifest.txt", lines.join("\n").as_bytes())
}

fn options(commit_threshold: u64, ignore_above: u64) -> IngestConfig {
    IngestConfig { commit_threshold, ignore_above }
}

fn line(key: &str, path: &Path) -> String {
    format!("{} {}", key, path.display())
}

#[sqlx::test]
async fn test_ingest_two_files_end_to_end(pool: PgPool) -> sqlx::Result<()> {
    let store = Store::new(pool.clone());
    let dir = TempDir::new().unwrap();

    let foo = write_file(&dir, "foo.bin", b"foo-bytes");
    let bar = write_file(&dir, "bar.bin", b"bar-bytes");
    let manifest = write_manifest(&dir, &[line("K1", &foo), line("K2", &bar)]);

    let inserted = store
        .ingest_manifest(&manifest, &options(100 * 1024 * 1024, 200 * 1024 * 1024))
        .await
        .unwrap();

    assert_eq!(inserted, 2);
    assert_eq!(store.get_blob("K1").await.unwrap().as_deref(), Some(&b"foo-bytes"[..]));
    assert_eq!(store.get_blob("K2").await.unwrap().as_deref(), Some(&b"bar-bytes"[..]));

    Ok(())
}

#[sqlx::test]
async fn test_single_token_line_uses_path_as_key(pool: PgPool) -> sqlx::Result<()> {
    let store = Store::new(pool.clone());
    let dir = TempDir::new().unwrap();

    let foo = write_file(&dir, "foo.bin", b"payload");
    let manifest = write_manifest(&dir, &[foo.display().to_string()]);

    let inserted = store
        .ingest_manifest(&manifest, &options(100 * 1024 * 1024, 200 * 1024 * 1024))
        .await
        .unwrap();

    assert_eq!(inserted, 1);
    let key = foo.display().to_string();
    assert_eq!(store.get_blob(&key).await.unwrap().as_deref(), Some(&b"payload"[..]));

    Ok(())
}

#[sqlx::test]
async fn test_missing_source_is_skipped(pool: PgPool) -> sqlx::Result<()> {
    let store = Store::new(pool.clone());
    let dir = TempDir::new().unwrap();

    let foo = write_file(&dir, "foo.bin", b"foo");
    let bar = write_file(&dir, "bar.bin", b"bar");
    let missing = dir.path().join("no-such-file.bin");
    let manifest = write_manifest(
        &dir,
        &[line("K1", &foo), line("KMISS", &missing), line("K2", &bar)],
    );

    let inserted = store
        .ingest_manifest(&manifest, &options(100 * 1024 * 1024, 200 * 1024 * 1024))
        .await
        .unwrap();

    // The missing line neither errors nor stops the lines after it.
    assert_eq!(inserted, 2);
    assert!(store.get_blob("KMISS").await.unwrap().is_none());
    assert!(store.get_blob("K2").await.unwrap().is_some());

    Ok(())
}

#[sqlx::test]
async fn test_oversize_source_is_skipped(pool: PgPool) -> sqlx::Result<()> {
    let store = Store::new(pool.clone());
    let dir = TempDir::new().unwrap();

    let big = write_file(&dir, "big.bin", b"0123456789");
    let small = write_file(&dir, "small.bin", b"ok");
    let manifest = write_manifest(&dir, &[line("KBIG", &big), line("KSMALL", &small)]);

    let inserted = store
        .ingest_manifest(&manifest, &options(100 * 1024 * 1024, 4))
        .await
        .unwrap();

    assert_eq!(inserted, 1);
    assert!(store.get_blob("KBIG").await.unwrap().is_none());
    assert!(store.get_blob("KSMALL").await.unwrap().is_some());

    Ok(())
}

#[sqlx::test]
async fn test_duplicate_keys_are_first_writer_wins(pool: PgPool) -> sqlx::Result<()> {
    let store = Store::new(pool.clone());
    let dir = TempDir::new().unwrap();

    let first = write_file(&dir, "first.bin", b"original");
    let manifest = write_manifest(&dir, &[line("K1", &first)]);
    let opts = options(100 * 1024 * 1024, 200 * 1024 * 1024);

    assert_eq!(store.ingest_manifest(&manifest, &opts).await.unwrap(), 1);

    // Re-running the same manifest inserts nothing new.
    assert_eq!(store.ingest_manifest(&manifest, &opts).await.unwrap(), 0);

    // A different source under the same key is a no-op as well.
    let second = write_file(&dir, "second.bin", b"replacement");
    let manifest2 = write_manifest(&dir, &[line("K1", &second)]);
    assert_eq!(store.ingest_manifest(&manifest2, &opts).await.unwrap(), 0);

    assert_eq!(store.get_blob("K1").await.unwrap().as_deref(), Some(&b"original"[..]));
    assert_eq!(store.count_blobs().await.unwrap(), 1);

    Ok(())
}

#[sqlx::test]
async fn test_commit_threshold_splits_batches(pool: PgPool) -> sqlx::Result<()> {
    let store = Store::new(pool.clone());
    let dir = TempDir::new().unwrap();

    // 8 bytes each with a 10-byte threshold: the second file tips the
    // first batch over, the third lands in a final batch committed at
    // stream end.
    let a = write_file(&dir, "a.bin", b"aaaaaaaa");
    let b = write_file(&dir, "b.bin", b"bbbbbbbb");
    let c = write_file(&dir, "c.bin", b"cccccccc");
    let manifest = write_manifest(&dir, &[line("KA", &a), line("KB", &b), line("KC", &c)]);

    let inserted = store
        .ingest_manifest(&manifest, &options(10, 200 * 1024 * 1024))
        .await
        .unwrap();

    assert_eq!(inserted, 3);
    for key in ["KA", "KB", "KC"] {
        assert!(store.get_blob(key).await.unwrap().is_some(), "{} missing", key);
    }

    Ok(())
}

#[sqlx::test]
async fn test_failure_keeps_committed_batches_and_rolls_back_in_flight(
    pool: PgPool,
) -> sqlx::Result<()> {
    let store = Store::new(pool.clone());
    let dir = TempDir::new().unwrap();

    // First file crosses the threshold on its own, so it commits before
    // the failure. The second file sits in a fresh, uncommitted batch when
    // the third line blows up (its source is a directory and cannot be
    // read as a file).
    let big = write_file(&dir, "big.bin", b"0123456789");
    let small = write_file(&dir, "small.bin", b"abc");
    let unreadable = dir.path().join("subdir");
    std::fs::create_dir(&unreadable).unwrap();
    let manifest = write_manifest(
        &dir,
        &[line("KBIG", &big), line("KSMALL", &small), line("KBAD", &unreadable)],
    );

    let err = store
        .ingest_manifest(&manifest, &options(5, 200 * 1024 * 1024))
        .await
        .unwrap_err();

    match err {
        StoreError::IngestionAborted { inserted, batch_bytes, total_bytes, .. } => {
            // Both inserts executed before the abort; only the first one
            // had been committed.
            assert_eq!(inserted, 2);
            assert_eq!(batch_bytes, 3);
            assert_eq!(total_bytes, 13);
        },
        other => panic!("expected IngestionAborted, got {:?}", other),
    }

    assert_eq!(store.get_blob("KBIG").await.unwrap().as_deref(), Some(&b"0123456789"[..]));
    assert!(store.get_blob("KSMALL").await.unwrap().is_none());
    assert!(store.get_blob("KBAD").await.unwrap().is_none());

    Ok(())
}

#[sqlx::test]
async fn test_missing_manifest_aborts_with_bookkeeping(pool: PgPool) -> sqlx::Result<()> {
    let store = Store::new(pool.clone());
    let dir = TempDir::new().unwrap();

    let err = store
        .ingest_manifest(dir.path().join("absent.txt"), &options(10, 20))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::IngestionAborted { inserted: 0, batch_bytes: 0, total_bytes: 0, .. }
    ));

    Ok(())
}

#[sqlx::test]
async fn test_truncate_blobs(pool: PgPool) -> sqlx::Result<()> {
    let store = Store::new(pool.clone());
    let dir = TempDir::new().unwrap();

    let foo = write_file(&dir, "foo.bin", b"foo");
    let manifest = write_manifest(&dir, &[line("K1", &foo)]);
    store
        .ingest_manifest(&manifest, &options(100 * 1024 * 1024, 200 * 1024 * 1024))
        .await
        .unwrap();
    assert_eq!(store.count_blobs().await.unwrap(), 1);

    store.truncate_blobs().await.unwrap();
    assert_eq!(store.count_blobs().await.unwrap(), 0);

    Ok(())
}
