use crate::blob::BlobStore;
use crate::config::RetentionConfig;
use crate::store::RecordStore;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// The retention sweeper
///
/// Enforces the fixed-age retention policy on inspections and their blobs on
/// a recurring schedule: a short startup delay, then one run per interval.
/// No step failure is fatal; every failure path degrades to retrying on the
/// next cycle.
pub struct RetentionSweeper<R: RecordStore, B: BlobStore> {
    store: Arc<R>,
    blobs: Arc<B>,
    config: RetentionConfig,
    started: AtomicBool,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<R: RecordStore, B: BlobStore> RetentionSweeper<R, B> {
    pub fn new(store: Arc<R>, blobs: Arc<B>, config: RetentionConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        RetentionSweeper {
            store,
            blobs,
            config,
            started: AtomicBool::new(false),
            shutdown,
            task: Mutex::new(None),
        }
    }

    /// Begin the recurring schedule. Calling this on an already-started
    /// sweeper is a no-op; there is no restart path on the same instance.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Retention sweeper already started");
            return;
        }

        let store = Arc::clone(&self.store);
        let blobs = Arc::clone(&self.blobs);
        let config = self.config.clone();
        let mut shutdown = self.shutdown.subscribe();

        let task = tokio::spawn(async move {
            info!(
                "Retention sweeper started: retention {}d, analytics retention {}d, interval {}h",
                config.retention_days, config.analytics_retention_days, config.sweep_interval_hours
            );

            let startup_delay = std::time::Duration::from_secs(config.startup_delay_seconds);
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = tokio::time::sleep(startup_delay) => {}
            }

            let interval = std::time::Duration::from_secs(config.sweep_interval_hours * 60 * 60);
            loop {
                run_cleanup(&store, &blobs, &config).await;

                tokio::select! {
                    _ = shutdown.changed() => return,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });

        match self.task.lock() {
            Ok(mut slot) => *slot = Some(task),
            Err(_) => error!("Retention sweeper task slot poisoned"),
        }
    }

    /// Whether start() has been called on this instance
    #[allow(dead_code)]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Disable the recurring schedule. An in-flight run is allowed to
    /// complete before this returns. Safe to call from any state and
    /// idempotent.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);

        let task = match self.task.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Retention sweeper task failed: {e}");
            }
            info!("Retention sweeper stopped");
        }
    }

    /// Execute a single sweep immediately, outside the schedule.
    pub async fn run_once(&self) {
        run_cleanup(&self.store, &self.blobs, &self.config).await;
    }
}

async fn run_cleanup<R: RecordStore, B: BlobStore>(
    store: &Arc<R>,
    blobs: &Arc<B>,
    config: &RetentionConfig,
) {
    info!("Running retention sweep");

    if let Err(e) = expire_inspections(store, blobs, config.retention_days).await {
        error!("Inspection cleanup failed: {e:#}");
    }

    if let Err(e) = sweep_orphaned_blobs(blobs, config.retention_days).await {
        error!("Orphaned blob sweep failed: {e:#}");
    }

    if let Err(e) = expire_stale_analytics(store, config.analytics_retention_days).await {
        error!("Analytics expiry failed: {e:#}");
    }

    info!("Retention sweep completed");
}

/// Delete inspections older than the retention window as one atomic batch,
/// then delete their images best-effort. The record deletion is the
/// authoritative action; a blob failure never rolls it back.
async fn expire_inspections<R: RecordStore, B: BlobStore>(
    store: &Arc<R>,
    blobs: &Arc<B>,
    retention_days: u32,
) -> Result<()> {
    let cutoff = Utc::now() - Duration::days(i64::from(retention_days));

    let expired = store
        .query_older_than(cutoff)
        .await
        .context("Failed to query expired inspections")?;

    if expired.is_empty() {
        debug!("No expired inspections");
        return Ok(());
    }

    let mut ids = Vec::with_capacity(expired.len());
    let mut blob_paths = Vec::new();
    for record in &expired {
        ids.push(record.id);
        if let Some(url) = record.image_url.as_deref() {
            if let Some(path) = image_blob_path(url) {
                blob_paths.push(path);
            }
        }
    }

    store
        .delete_batch(&ids)
        .await
        .context("Failed to delete expired inspections")?;

    info!("Deleted {} expired inspections", ids.len());

    for path in blob_paths {
        if let Err(e) = blobs.delete_blob(&path).await {
            warn!("Failed to delete inspection image {path}: {e}");
        }
    }

    Ok(())
}

/// Delete every blob older than the retention window, catching images whose
/// owning record was removed through some other path.
async fn sweep_orphaned_blobs<B: BlobStore>(blobs: &Arc<B>, retention_days: u32) -> Result<()> {
    let cutoff = Utc::now() - Duration::days(i64::from(retention_days));

    let aged: Vec<_> = blobs
        .list_blobs(None)
        .await
        .context("Failed to list blobs")?
        .into_iter()
        .filter(|blob| blob.created_at < cutoff)
        .collect();

    let mut deleted = 0usize;
    for blob in &aged {
        match blobs.delete_blob(&blob.path).await {
            Ok(()) => deleted += 1,
            Err(e) => warn!("Failed to delete orphaned blob {}: {e}", blob.path),
        }
    }

    info!("Swept {deleted} of {} aged blobs", aged.len());
    Ok(())
}

async fn expire_stale_analytics<R: RecordStore>(
    store: &Arc<R>,
    analytics_retention_days: u32,
) -> Result<()> {
    let cutoff = Utc::now() - Duration::days(i64::from(analytics_retention_days));

    let removed = store
        .delete_analytics_older_than(cutoff)
        .await
        .context("Failed to expire cached analytics")?;

    info!("Expired {removed} cached analytics snapshots");
    Ok(())
}

/// Derive the blob path for an inspection's image URL: the final path
/// segment, under the inspections/ prefix.
fn image_blob_path(image_url: &str) -> Option<String> {
    let file_name = image_url.rsplit('/').next()?;
    if file_name.is_empty() {
        return None;
    }
    Some(format!("inspections/{file_name}"))
}

#[cfg(test)]
mod tests {
    use super::image_blob_path;

    #[test]
    fn derives_blob_path_from_image_url() {
        assert_eq!(
            image_blob_path("https://storage.example.com/bucket/inspections/abc123.jpg"),
            Some("inspections/abc123.jpg".to_string())
        );
        assert_eq!(
            image_blob_path("abc123.jpg"),
            Some("inspections/abc123.jpg".to_string())
        );
        assert_eq!(image_blob_path("https://storage.example.com/bucket/"), None);
    }
}
