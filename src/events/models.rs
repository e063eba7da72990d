use crate::analytics::AnalyticsSnapshot;
use crate::store::InspectionRecord;
use serde::{Deserialize, Serialize};

/// A structured event pushed to connected dashboard clients.
///
/// Serializes as `{ "event": "<name>", "payload": { ... } }`, which is the
/// shape the dashboard transport forwards verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    InspectionAdded(InspectionRecord),
    InspectionUpdated(InspectionRecord),
    AnalyticsUpdate(AnalyticsSnapshot),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::InspectionAdded(_) => "inspection_added",
            ServerEvent::InspectionUpdated(_) => "inspection_updated",
            ServerEvent::AnalyticsUpdate(_) => "analytics_update",
        }
    }
}
