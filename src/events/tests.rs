use crate::analytics::AnalyticsSnapshot;
use crate::events::channel::{BroadcastChannel, EventSink};
use crate::events::models::ServerEvent;
use crate::test_utils::record_with;
use chrono::Utc;

#[test]
fn events_serialize_with_name_and_payload() {
    let record = record_with(Some("brake-pad"), Some("pending"), Some(Utc::now()));
    let event = ServerEvent::InspectionAdded(record.clone());

    let json: serde_json::Value = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "inspection_added");
    assert_eq!(json["payload"]["id"], record.id.to_string());
    assert_eq!(json["payload"]["partType"], "brake-pad");

    let snapshot = AnalyticsSnapshot::compute(&[record], Utc::now());
    let event = ServerEvent::AnalyticsUpdate(snapshot);
    let json: serde_json::Value = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "analytics_update");
    assert_eq!(json["payload"]["total"], 1);
    assert!(json["payload"]["byType"].is_object());
    assert!(json["payload"]["byDate"].is_object());
    assert!(json["payload"]["generatedAt"].is_string());
}

#[test]
fn events_round_trip_through_json() {
    let record = record_with(None, None, None);
    let event = ServerEvent::InspectionUpdated(record);

    let json = serde_json::to_string(&event).unwrap();
    let parsed: ServerEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, event);
    assert_eq!(parsed.name(), "inspection_updated");
}

#[tokio::test]
async fn broadcast_channel_fans_out_to_every_subscriber() {
    let channel = BroadcastChannel::new(16);
    let mut first = channel.subscribe();
    let mut second = channel.subscribe();

    let event = ServerEvent::AnalyticsUpdate(AnalyticsSnapshot::compute(&[], Utc::now()));
    channel.emit(event.clone()).await.unwrap();

    assert_eq!(first.recv().await.unwrap(), event);
    assert_eq!(second.recv().await.unwrap(), event);
}

#[tokio::test]
async fn emitting_without_subscribers_is_not_an_error() {
    let channel = BroadcastChannel::new(16);
    let event = ServerEvent::AnalyticsUpdate(AnalyticsSnapshot::compute(&[], Utc::now()));
    channel.emit(event).await.unwrap();
}
