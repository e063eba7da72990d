use crate::analytics::AnalyticsSnapshot;
use crate::blob::fake::FakeBlobStore;
use crate::cleanup::sweeper::RetentionSweeper;
use crate::config::RetentionConfig;
use crate::store::fake::FakeRecordStore;
use crate::store::record_store::RecordStore;
use crate::test_utils::{record_aged_days, record_aged_days_with_image};
use bytes::Bytes;
use chrono::{Duration, Utc};
use std::sync::Arc;

fn test_config() -> RetentionConfig {
    RetentionConfig {
        retention_days: 90,
        analytics_retention_days: 30,
        sweep_interval_hours: 24,
        startup_delay_seconds: 60,
    }
}

fn make_sweeper(
    store: &Arc<FakeRecordStore>,
    blobs: &Arc<FakeBlobStore>,
    config: RetentionConfig,
) -> RetentionSweeper<FakeRecordStore, FakeBlobStore> {
    RetentionSweeper::new(Arc::clone(store), Arc::clone(blobs), config)
}

#[tokio::test]
async fn sweep_deletes_exactly_the_expired_records_and_their_images() {
    let store = Arc::new(FakeRecordStore::new());
    let blobs = Arc::new(FakeBlobStore::new());

    let oldest =
        record_aged_days_with_image(100, "https://blobs.example.com/bucket/inspections/a.jpg");
    let expired =
        record_aged_days_with_image(91, "https://blobs.example.com/bucket/inspections/b.jpg");
    let recent = record_aged_days(89);
    let fresh = record_aged_days(1);

    for record in [&oldest, &expired, &recent, &fresh] {
        store.fake_add_record(record.clone());
    }

    let sweeper = make_sweeper(&store, &blobs, test_config());
    sweeper.run_once().await;

    let remaining = store.get_all().await.unwrap();
    let mut remaining_ids: Vec<_> = remaining.iter().map(|r| r.id).collect();
    remaining_ids.sort();
    let mut expected = vec![recent.id, fresh.id];
    expected.sort();
    assert_eq!(remaining_ids, expected);

    // Each expired image was attempted exactly once
    let mut attempts = blobs.fake_delete_attempts().await;
    attempts.sort();
    assert_eq!(
        attempts,
        vec![
            "inspections/a.jpg".to_string(),
            "inspections/b.jpg".to_string()
        ]
    );
}

#[tokio::test]
async fn sweep_with_no_expired_records_still_sweeps_orphaned_blobs() {
    let store = Arc::new(FakeRecordStore::new());
    let blobs = Arc::new(FakeBlobStore::new());

    store.fake_add_record(record_aged_days(10));
    blobs
        .fake_add_blob(
            "inspections/orphan.jpg",
            Bytes::from("old"),
            Utc::now() - Duration::days(100),
        )
        .await;
    blobs
        .fake_add_blob(
            "inspections/kept.jpg",
            Bytes::from("new"),
            Utc::now() - Duration::days(5),
        )
        .await;

    let sweeper = make_sweeper(&store, &blobs, test_config());
    sweeper.run_once().await;

    assert_eq!(store.fake_record_count(), 1);
    assert_eq!(
        blobs.fake_paths().await,
        vec!["inspections/kept.jpg".to_string()]
    );
    // Only the orphan sweep touched storage
    assert_eq!(
        blobs.fake_delete_attempts().await,
        vec!["inspections/orphan.jpg".to_string()]
    );
}

#[tokio::test]
async fn blob_failure_does_not_roll_back_record_deletion_or_skip_siblings() {
    let store = Arc::new(FakeRecordStore::new());
    let blobs = Arc::new(FakeBlobStore::new());

    let first =
        record_aged_days_with_image(120, "https://blobs.example.com/bucket/inspections/one.jpg");
    let second =
        record_aged_days_with_image(110, "https://blobs.example.com/bucket/inspections/two.jpg");
    store.fake_add_record(first.clone());
    store.fake_add_record(second.clone());

    blobs
        .fake_add_blob(
            "inspections/two.jpg",
            Bytes::from("img"),
            Utc::now() - Duration::days(1),
        )
        .await;
    blobs.fake_fail_delete("inspections/one.jpg").await;

    let sweeper = make_sweeper(&store, &blobs, test_config());
    sweeper.run_once().await;

    // Record deletion is authoritative and already committed
    assert_eq!(store.fake_record_count(), 0);
    // The sibling blob was still deleted
    assert!(blobs.fake_paths().await.is_empty());
    assert_eq!(blobs.fake_delete_attempts().await.len(), 2);
}

#[tokio::test]
async fn failed_record_deletion_leaves_blobs_untouched() {
    let store = Arc::new(FakeRecordStore::new());
    let blobs = Arc::new(FakeBlobStore::new());

    let expired =
        record_aged_days_with_image(100, "https://blobs.example.com/bucket/inspections/a.jpg");
    store.fake_add_record(expired);
    store.fake_fail_deletes(true);

    let sweeper = make_sweeper(&store, &blobs, test_config());
    sweeper.run_once().await;

    assert_eq!(store.fake_record_count(), 1);
    assert!(blobs.fake_delete_attempts().await.is_empty());
}

#[tokio::test]
async fn stale_cached_analytics_are_expired_on_the_shorter_window() {
    let store = Arc::new(FakeRecordStore::new());
    let blobs = Arc::new(FakeBlobStore::new());

    let stale = AnalyticsSnapshot::compute(&[], Utc::now() - Duration::days(45));
    let recent = AnalyticsSnapshot::compute(&[], Utc::now() - Duration::days(29));
    store.put_analytics(&stale).await.unwrap();
    store.put_analytics(&recent).await.unwrap();

    let sweeper = make_sweeper(&store, &blobs, test_config());
    sweeper.run_once().await;

    let cached = store.fake_analytics();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].generated_at, recent.generated_at);
}

#[tokio::test]
async fn a_failing_step_does_not_abort_the_remaining_steps() {
    let store = Arc::new(FakeRecordStore::new());
    let blobs = Arc::new(FakeBlobStore::new());

    // Step 1 fails at the age query
    store.fake_fail_reads(true);
    let stale = AnalyticsSnapshot::compute(&[], Utc::now() - Duration::days(45));
    store.put_analytics(&stale).await.unwrap();
    blobs
        .fake_add_blob(
            "inspections/orphan.jpg",
            Bytes::from("old"),
            Utc::now() - Duration::days(120),
        )
        .await;

    let sweeper = make_sweeper(&store, &blobs, test_config());
    sweeper.run_once().await;

    // Steps 5 and 6 still ran
    assert!(blobs.fake_paths().await.is_empty());
    assert!(store.fake_analytics().is_empty());
}

#[tokio::test]
async fn start_is_idempotent() {
    let store = Arc::new(FakeRecordStore::new());
    let blobs = Arc::new(FakeBlobStore::new());

    let sweeper = make_sweeper(&store, &blobs, test_config());
    assert!(!sweeper.is_started());

    sweeper.start();
    sweeper.start();
    assert!(sweeper.is_started());

    sweeper.stop().await;
}

#[tokio::test]
async fn stop_is_idempotent_and_safe_without_start() {
    let store = Arc::new(FakeRecordStore::new());
    let blobs = Arc::new(FakeBlobStore::new());

    let sweeper = make_sweeper(&store, &blobs, test_config());
    sweeper.stop().await;

    sweeper.start();
    sweeper.stop().await;
    sweeper.stop().await;

    // The schedule stays disabled after stop; start() does not re-arm it
    sweeper.start();
    assert!(sweeper.is_started());
}

#[tokio::test(start_paused = true)]
async fn first_run_fires_after_the_startup_delay() {
    let store = Arc::new(FakeRecordStore::new());
    let blobs = Arc::new(FakeBlobStore::new());

    store.fake_add_record(record_aged_days(120));

    let sweeper = make_sweeper(&store, &blobs, test_config());
    sweeper.start();

    // Not yet: the startup delay has not elapsed
    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    assert_eq!(store.fake_record_count(), 1);

    tokio::time::sleep(std::time::Duration::from_secs(31)).await;
    assert_eq!(store.fake_record_count(), 0);

    sweeper.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stopping_during_the_startup_delay_prevents_the_first_run() {
    let store = Arc::new(FakeRecordStore::new());
    let blobs = Arc::new(FakeBlobStore::new());

    store.fake_add_record(record_aged_days(120));

    let sweeper = make_sweeper(&store, &blobs, test_config());
    sweeper.start();
    sweeper.stop().await;

    tokio::time::sleep(std::time::Duration::from_secs(7200)).await;
    assert_eq!(store.fake_record_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn runs_recur_once_per_interval() {
    let store = Arc::new(FakeRecordStore::new());
    let blobs = Arc::new(FakeBlobStore::new());

    store.fake_add_record(record_aged_days(120));

    let sweeper = make_sweeper(&store, &blobs, test_config());
    sweeper.start();

    // First run after the startup delay
    tokio::time::sleep(std::time::Duration::from_secs(61)).await;
    assert_eq!(store.fake_record_count(), 0);

    // A record that expires before the next scheduled run
    store.fake_add_record(record_aged_days(95));
    tokio::time::sleep(std::time::Duration::from_secs(24 * 60 * 60 + 1)).await;
    assert_eq!(store.fake_record_count(), 0);

    sweeper.stop().await;
}
