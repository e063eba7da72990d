use crate::blob::blob_store::BlobStore;
use crate::blob::fake::FakeBlobStore;
use bytes::Bytes;
use chrono::{Duration, Utc};

#[tokio::test]
async fn list_blobs_reports_metadata_and_honors_prefix() {
    let blobs = FakeBlobStore::new();
    let created = Utc::now() - Duration::days(3);

    blobs
        .fake_add_blob("inspections/a.jpg", Bytes::from("aaaa"), created)
        .await;
    blobs
        .fake_add_blob("reports/b.pdf", Bytes::from("bb"), created)
        .await;

    let all = blobs.list_blobs(None).await.unwrap();
    assert_eq!(all.len(), 2);

    let inspections = blobs.list_blobs(Some("inspections/")).await.unwrap();
    assert_eq!(inspections.len(), 1);
    assert_eq!(inspections[0].path, "inspections/a.jpg");
    assert_eq!(inspections[0].size_bytes, 4);
    assert_eq!(inspections[0].created_at, created);
}

#[tokio::test]
async fn delete_blob_removes_and_records_the_attempt() {
    let blobs = FakeBlobStore::new();
    blobs
        .fake_add_blob("inspections/a.jpg", Bytes::from("aaaa"), Utc::now())
        .await;

    blobs.delete_blob("inspections/a.jpg").await.unwrap();

    assert!(blobs.fake_paths().await.is_empty());
    assert_eq!(
        blobs.fake_delete_attempts().await,
        vec!["inspections/a.jpg".to_string()]
    );
}

#[tokio::test]
async fn deleting_a_missing_blob_is_a_no_op() {
    let blobs = FakeBlobStore::new();
    blobs.delete_blob("inspections/gone.jpg").await.unwrap();
    assert_eq!(blobs.fake_delete_attempts().await.len(), 1);
}

#[tokio::test]
async fn failed_delete_is_recorded_and_leaves_the_blob() {
    let blobs = FakeBlobStore::new();
    blobs
        .fake_add_blob("inspections/stuck.jpg", Bytes::from("data"), Utc::now())
        .await;
    blobs.fake_fail_delete("inspections/stuck.jpg").await;

    let result = blobs.delete_blob("inspections/stuck.jpg").await;

    assert!(result.is_err());
    assert_eq!(blobs.fake_delete_attempts().await.len(), 1);
    assert_eq!(
        blobs.fake_paths().await,
        vec!["inspections/stuck.jpg".to_string()]
    );
}
