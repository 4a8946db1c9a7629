//! Storage names stay unique under heavy concurrent ingestion.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use vt_core::ItemId;
use vt_imaging::{Ingestor, OriginalStore};

const UPLOADS: usize = 1000;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_uploads_never_collide() {
    let dir = tempfile::tempdir().unwrap();
    let ingestor = Arc::new(Ingestor::new(OriginalStore::new(dir.path()), 1024));
    let owner = ItemId::new();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..UPLOADS {
        let ingestor = ingestor.clone();
        tasks.spawn(async move {
            let body = Bytes::from(format!("upload-{i}"));
            ingestor
                .ingest(owner, "image/jpeg", Some("photo.jpg"), body)
                .await
        });
    }

    let mut names = HashSet::with_capacity(UPLOADS);
    while let Some(joined) = tasks.join_next().await {
        let stored = joined.unwrap().unwrap();
        assert!(names.insert(stored.storage_name), "duplicate storage name");
    }
    assert_eq!(names.len(), UPLOADS);

    // Each upload landed in its own file with its own bytes.
    let on_disk = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(on_disk, UPLOADS);
}

#[tokio::test]
async fn rejected_uploads_leave_store_empty() {
    let dir = tempfile::tempdir().unwrap();
    let ingestor = Ingestor::new(OriginalStore::new(dir.path()), 8);

    let too_big = ingestor
        .ingest(ItemId::new(), "image/png", None, Bytes::from_static(b"123456789"))
        .await;
    let wrong_type = ingestor
        .ingest(ItemId::new(), "text/html", None, Bytes::from_static(b"<html>"))
        .await;

    assert_eq!(too_big.unwrap_err().http_status(), 413);
    assert_eq!(wrong_type.unwrap_err().http_status(), 400);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
