use crate::analytics::AnalyticsSnapshot;
use crate::store::error::StoreError;
use crate::store::models::{ChangeBatch, InspectionRecord, InspectionUpdate, NewInspection};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// RecordStore trait defining the interface to the inspection collection
///
/// Every committed mutation publishes exactly one [`ChangeBatch`] to all
/// current subscribers, in commit order. Subscribers that fall behind the
/// channel capacity observe a lag error and pick up again at the next batch.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Register a subscription for change batches on the inspection
    /// collection. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<ChangeBatch>;

    /// Insert a new inspection. The store assigns the id and the timestamp
    /// and publishes an `Added` batch after commit.
    async fn insert(&self, new: NewInspection) -> Result<InspectionRecord, StoreError>;

    /// Apply a partial update to an inspection and publish a `Modified`
    /// batch carrying the updated record.
    async fn update(
        &self,
        id: Uuid,
        update: InspectionUpdate,
    ) -> Result<InspectionRecord, StoreError>;

    /// Read the full inspection set.
    async fn get_all(&self) -> Result<Vec<InspectionRecord>, StoreError>;

    /// Query inspections with a timestamp strictly older than `cutoff`.
    /// Records without a timestamp never match.
    async fn query_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<InspectionRecord>, StoreError>;

    /// Delete the given inspections as a single all-or-nothing batch and
    /// publish one `Removed` batch carrying every deleted record. Ids that
    /// do not exist are skipped.
    async fn delete_batch(&self, ids: &[Uuid]) -> Result<(), StoreError>;

    /// Cache a computed analytics snapshot. Cached snapshots are derived
    /// data, expired by retention, never read back as a source of truth.
    async fn put_analytics(&self, snapshot: &AnalyticsSnapshot) -> Result<(), StoreError>;

    /// Delete cached snapshots generated before `cutoff`. Returns how many
    /// were removed.
    async fn delete_analytics_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    /// Seed a record as-is, without publishing a change batch (test-only)
    #[cfg(test)]
    async fn add_record(&self, record: InspectionRecord) -> Result<(), StoreError>;
}

/// Implementation of RecordStore trait for Arc<T> where T implements RecordStore
///
/// This allows sharing store instances across tasks and components
/// efficiently.
#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn subscribe(&self) -> broadcast::Receiver<ChangeBatch> {
        (**self).subscribe()
    }

    async fn insert(&self, new: NewInspection) -> Result<InspectionRecord, StoreError> {
        (**self).insert(new).await
    }

    async fn update(
        &self,
        id: Uuid,
        update: InspectionUpdate,
    ) -> Result<InspectionRecord, StoreError> {
        (**self).update(id, update).await
    }

    async fn get_all(&self) -> Result<Vec<InspectionRecord>, StoreError> {
        (**self).get_all().await
    }

    async fn query_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<InspectionRecord>, StoreError> {
        (**self).query_older_than(cutoff).await
    }

    async fn delete_batch(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        (**self).delete_batch(ids).await
    }

    async fn put_analytics(&self, snapshot: &AnalyticsSnapshot) -> Result<(), StoreError> {
        (**self).put_analytics(snapshot).await
    }

    async fn delete_analytics_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        (**self).delete_analytics_older_than(cutoff).await
    }

    #[cfg(test)]
    async fn add_record(&self, record: InspectionRecord) -> Result<(), StoreError> {
        (**self).add_record(record).await
    }
}
