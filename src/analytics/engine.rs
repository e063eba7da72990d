use crate::analytics::snapshot::AnalyticsSnapshot;
use crate::events::{EventSink, ServerEvent};
use crate::store::{ChangeBatch, ChangeType, RecordStore};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// The real-time aggregation engine
///
/// Subscribes to the inspection collection, forwards added/updated records
/// to the push channel, and recomputes the analytics snapshot from a fresh
/// full read after every batch. Recomputation is O(record count) per batch;
/// the fresh read keeps the snapshot consistent even when a delta was
/// missed.
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    /// Register a persistent subscription against the record store and
    /// begin emitting events on `channel`. Returns a handle that stops the
    /// subscription.
    pub fn start<R, E>(store: Arc<R>, channel: Arc<E>) -> EngineHandle
    where
        R: RecordStore,
        E: EventSink,
    {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_engine(store, channel, shutdown_rx));

        info!("Analytics engine started");
        EngineHandle {
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }
}

/// Handle to a running analytics engine
pub struct EngineHandle {
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl EngineHandle {
    /// Release the subscription. Safe to call from any state and idempotent;
    /// once it returns, no further events are emitted.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);

        let task = self.task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Analytics engine task failed: {e}");
            }
            info!("Analytics engine stopped");
        }
    }
}

async fn run_engine<R, E>(store: Arc<R>, channel: Arc<E>, mut shutdown: watch::Receiver<bool>)
where
    R: RecordStore,
    E: EventSink,
{
    let mut batches = store.subscribe();

    // Prime subscribers with the current state before processing deltas.
    recompute_and_emit(&store, &channel).await;

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!("Analytics engine shutting down");
                break;
            }
            batch = batches.recv() => match batch {
                Ok(batch) => process_batch(&store, &channel, batch).await,
                Err(RecvError::Lagged(skipped)) => {
                    // A resync after falling behind, same as a reconnect.
                    warn!("Change subscription lagged, skipped {skipped} batches; resyncing");
                    recompute_and_emit(&store, &channel).await;
                }
                Err(RecvError::Closed) => {
                    info!("Change subscription closed, stopping analytics engine");
                    break;
                }
            }
        }
    }
}

/// Process one change batch fully before the next one is taken: echo added
/// and modified records, then recompute the snapshot once for the batch.
async fn process_batch<R, E>(store: &Arc<R>, channel: &Arc<E>, batch: ChangeBatch)
where
    R: RecordStore,
    E: EventSink,
{
    for change in batch.changes {
        let event = match change.change_type {
            ChangeType::Added => ServerEvent::InspectionAdded(change.record),
            ChangeType::Modified => ServerEvent::InspectionUpdated(change.record),
            // Removals are not echoed; clients see them in the next
            // snapshot's reduced totals.
            ChangeType::Removed => continue,
        };
        if let Err(e) = channel.emit(event).await {
            warn!("Failed to emit inspection event: {e}");
        }
    }

    recompute_and_emit(store, channel).await;
}

async fn recompute_and_emit<R, E>(store: &Arc<R>, channel: &Arc<E>)
where
    R: RecordStore,
    E: EventSink,
{
    let records = match store.get_all().await {
        Ok(records) => records,
        Err(e) => {
            // Swallowed; the next change batch triggers another attempt.
            error!("Failed to read inspections for analytics recomputation: {e}");
            return;
        }
    };

    let snapshot = AnalyticsSnapshot::compute(&records, Utc::now());
    debug!(
        "Recomputed analytics snapshot: total={}, pending={}, completed={}, failed={}",
        snapshot.total, snapshot.pending, snapshot.completed, snapshot.failed
    );

    if let Err(e) = store.put_analytics(&snapshot).await {
        warn!("Failed to cache analytics snapshot: {e}");
    }

    if let Err(e) = channel.emit(ServerEvent::AnalyticsUpdate(snapshot)).await {
        warn!("Failed to emit analytics update: {e}");
    }
}
