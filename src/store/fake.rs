use crate::analytics::AnalyticsSnapshot;
use crate::store::error::StoreError;
use crate::store::models::{
    ChangeBatch, ChangeType, InspectionRecord, InspectionUpdate, NewInspection, RecordChange,
};
use crate::store::record_store::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A fake in-memory implementation of the RecordStore trait for testing
///
/// Supports seeding records with controlled ids and timestamps, injecting
/// crafted change batches, and simulating read/delete failures.
#[derive(Clone)]
#[allow(dead_code)]
pub struct FakeRecordStore {
    records: Arc<RwLock<HashMap<Uuid, InspectionRecord>>>,
    analytics: Arc<RwLock<Vec<AnalyticsSnapshot>>>,
    changes: broadcast::Sender<ChangeBatch>,
    fail_reads: Arc<RwLock<bool>>,
    fail_deletes: Arc<RwLock<bool>>,
}

#[allow(dead_code)]
impl FakeRecordStore {
    /// Create a new empty FakeRecordStore
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        FakeRecordStore {
            records: Arc::new(RwLock::new(HashMap::new())),
            analytics: Arc::new(RwLock::new(Vec::new())),
            changes,
            fail_reads: Arc::new(RwLock::new(false)),
            fail_deletes: Arc::new(RwLock::new(false)),
        }
    }

    /// Seed a record as-is, without publishing a change batch
    pub fn fake_add_record(&self, record: InspectionRecord) {
        let mut records = self.records.write().unwrap();
        records.insert(record.id, record);
    }

    /// Publish a crafted change batch to all subscribers
    pub fn fake_push_batch(&self, batch: ChangeBatch) {
        let _ = self.changes.send(batch);
    }

    /// After calling with `true`, get_all and query_older_than return errors
    pub fn fake_fail_reads(&self, fail: bool) {
        *self.fail_reads.write().unwrap() = fail;
    }

    /// After calling with `true`, delete_batch returns errors
    pub fn fake_fail_deletes(&self, fail: bool) {
        *self.fail_deletes.write().unwrap() = fail;
    }

    /// Cached snapshots currently held, oldest first
    pub fn fake_analytics(&self) -> Vec<AnalyticsSnapshot> {
        self.analytics.read().unwrap().clone()
    }

    /// Number of records currently held
    pub fn fake_record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

impl Default for FakeRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    fn subscribe(&self) -> broadcast::Receiver<ChangeBatch> {
        self.changes.subscribe()
    }

    async fn insert(&self, new: NewInspection) -> Result<InspectionRecord, StoreError> {
        let record = InspectionRecord {
            id: Uuid::new_v4(),
            part_type: new.part_type,
            status: new.status,
            timestamp: Some(Utc::now()),
            image_url: new.image_url,
            location: new.location,
            condition: new.condition,
            notes: new.notes,
        };
        {
            let mut records = self.records.write().unwrap();
            records.insert(record.id, record.clone());
        }
        let _ = self
            .changes
            .send(ChangeBatch::single(ChangeType::Added, record.clone()));
        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        update: InspectionUpdate,
    ) -> Result<InspectionRecord, StoreError> {
        let record = {
            let mut records = self.records.write().unwrap();
            let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            if let Some(status) = update.status {
                record.status = Some(status);
            }
            if let Some(condition) = update.condition {
                record.condition = Some(condition);
            }
            if let Some(notes) = update.notes {
                record.notes = Some(notes);
            }
            record.clone()
        };
        let _ = self
            .changes
            .send(ChangeBatch::single(ChangeType::Modified, record.clone()));
        Ok(record)
    }

    async fn get_all(&self) -> Result<Vec<InspectionRecord>, StoreError> {
        if *self.fail_reads.read().unwrap() {
            return Err(StoreError::Query {
                op: "read",
                reason: "simulated failure".to_string(),
            });
        }
        let records = self.records.read().unwrap();
        let mut all: Vec<InspectionRecord> = records.values().cloned().collect();
        // Sort by timestamp to match SQLite behavior
        all.sort_by_key(|r| r.timestamp);
        Ok(all)
    }

    async fn query_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<InspectionRecord>, StoreError> {
        if *self.fail_reads.read().unwrap() {
            return Err(StoreError::Query {
                op: "age query",
                reason: "simulated failure".to_string(),
            });
        }
        let records = self.records.read().unwrap();
        let mut matching: Vec<InspectionRecord> = records
            .values()
            .filter(|r| matches!(r.timestamp, Some(ts) if ts < cutoff))
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.timestamp);
        Ok(matching)
    }

    async fn delete_batch(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        if *self.fail_deletes.read().unwrap() {
            return Err(StoreError::Query {
                op: "delete",
                reason: "simulated failure".to_string(),
            });
        }
        let removed = {
            let mut records = self.records.write().unwrap();
            ids.iter()
                .filter_map(|id| records.remove(id))
                .map(|record| RecordChange {
                    change_type: ChangeType::Removed,
                    record,
                })
                .collect::<Vec<_>>()
        };
        if !removed.is_empty() {
            let _ = self.changes.send(ChangeBatch { changes: removed });
        }
        Ok(())
    }

    async fn put_analytics(&self, snapshot: &AnalyticsSnapshot) -> Result<(), StoreError> {
        let mut analytics = self.analytics.write().unwrap();
        analytics.push(snapshot.clone());
        Ok(())
    }

    async fn delete_analytics_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut analytics = self.analytics.write().unwrap();
        let before = analytics.len();
        analytics.retain(|s| s.generated_at >= cutoff);
        Ok(before - analytics.len())
    }

    #[cfg(test)]
    async fn add_record(&self, record: InspectionRecord) -> Result<(), StoreError> {
        self.fake_add_record(record);
        Ok(())
    }
}
