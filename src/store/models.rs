use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One inspection event as stored in the inspections collection.
///
/// `status` is kept verbatim as written by the submitting client; use
/// [`InspectionStatus::from_raw`] when bucketing it into the three known
/// states. `timestamp` is assigned by the store on insert, but records
/// written by other collaborators may lack it, so reads tolerate its absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    pub id: Uuid,
    pub part_type: Option<String>,
    pub status: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub location: Option<String>,
    pub condition: Option<String>,
    pub notes: Option<String>,
}

/// Fields supplied by the caller when creating an inspection. The store
/// assigns the id and the timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInspection {
    pub part_type: Option<String>,
    pub status: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<String>,
    pub condition: Option<String>,
    pub notes: Option<String>,
}

/// Partial update applied to an existing inspection. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionUpdate {
    pub status: Option<String>,
    pub condition: Option<String>,
    pub notes: Option<String>,
}

/// The three known inspection states. Anything else a client wrote counts as
/// pending for aggregation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectionStatus {
    Pending,
    Completed,
    Failed,
}

impl InspectionStatus {
    /// Bucket a raw status string. Absent or unrecognized values map to
    /// `Pending`; the raw value itself is never rewritten on the record.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("completed") => InspectionStatus::Completed,
            Some("failed") => InspectionStatus::Failed,
            _ => InspectionStatus::Pending,
        }
    }
}

impl InspectionRecord {
    pub fn status_bucket(&self) -> InspectionStatus {
        InspectionStatus::from_raw(self.status.as_deref())
    }
}

/// Kind of mutation a change entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

/// A single entry in a change batch, carrying the full record after the
/// mutation (or as it was at deletion time for `Removed`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordChange {
    pub change_type: ChangeType,
    pub record: InspectionRecord,
}

/// An ordered batch of changes, published once per committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub changes: Vec<RecordChange>,
}

impl ChangeBatch {
    pub fn single(change_type: ChangeType, record: InspectionRecord) -> Self {
        ChangeBatch {
            changes: vec![RecordChange {
                change_type,
                record,
            }],
        }
    }
}
