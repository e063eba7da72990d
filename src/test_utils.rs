use crate::store::InspectionRecord;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Build a record with the given part type, status, and timestamp
pub fn record_with(
    part_type: Option<&str>,
    status: Option<&str>,
    timestamp: Option<DateTime<Utc>>,
) -> InspectionRecord {
    InspectionRecord {
        id: Uuid::new_v4(),
        part_type: part_type.map(str::to_string),
        status: status.map(str::to_string),
        timestamp,
        image_url: None,
        location: Some("Depot 4".to_string()),
        condition: None,
        notes: None,
    }
}

/// Build a record whose timestamp lies `days` days in the past
pub fn record_aged_days(days: i64) -> InspectionRecord {
    record_with(
        Some("brake-pad"),
        Some("completed"),
        Some(Utc::now() - Duration::days(days)),
    )
}

/// Same as [`record_aged_days`], with an image URL attached
pub fn record_aged_days_with_image(days: i64, image_url: &str) -> InspectionRecord {
    let mut record = record_aged_days(days);
    record.image_url = Some(image_url.to_string());
    record
}
