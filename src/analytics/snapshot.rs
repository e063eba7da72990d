use crate::store::{InspectionRecord, InspectionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket key for records with no usable part type or timestamp.
pub const UNKNOWN_BUCKET: &str = "Unknown";

/// Aggregate view over the full inspection set, recomputed from scratch on
/// every change and never mutated in place.
///
/// Holds `total == pending + completed + failed`, and both breakdown maps
/// sum to `total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub total: u64,
    pub pending: u64,
    pub completed: u64,
    pub failed: u64,
    pub by_date: BTreeMap<String, u64>,
    pub by_type: BTreeMap<String, u64>,
    pub generated_at: DateTime<Utc>,
}

impl AnalyticsSnapshot {
    /// Compute a fresh snapshot from a consistent read of the record set.
    pub fn compute(records: &[InspectionRecord], generated_at: DateTime<Utc>) -> Self {
        let mut pending = 0u64;
        let mut completed = 0u64;
        let mut failed = 0u64;
        let mut by_date: BTreeMap<String, u64> = BTreeMap::new();
        let mut by_type: BTreeMap<String, u64> = BTreeMap::new();

        for record in records {
            match record.status_bucket() {
                InspectionStatus::Pending => pending += 1,
                InspectionStatus::Completed => completed += 1,
                InspectionStatus::Failed => failed += 1,
            }

            *by_date.entry(date_key(record.timestamp)).or_insert(0) += 1;
            *by_type.entry(type_key(record.part_type.as_deref())).or_insert(0) += 1;
        }

        AnalyticsSnapshot {
            total: records.len() as u64,
            pending,
            completed,
            failed,
            by_date,
            by_type,
            generated_at,
        }
    }
}

/// UTC calendar date of the record's timestamp, e.g. "2026-08-04". The same
/// timestamp always maps to the same key.
fn date_key(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => ts.date_naive().to_string(),
        None => UNKNOWN_BUCKET.to_string(),
    }
}

fn type_key(part_type: Option<&str>) -> String {
    match part_type {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNKNOWN_BUCKET.to_string(),
    }
}
