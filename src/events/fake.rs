use crate::events::channel::EventSink;
use crate::events::error::ChannelError;
use crate::events::models::ServerEvent;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// A fake in-memory implementation of the EventSink trait for testing
///
/// Records every emitted event and lets tests await a given event count.
#[derive(Clone)]
#[allow(dead_code)]
pub struct FakeEventSink {
    events: Arc<Mutex<Vec<ServerEvent>>>,
    notify: Arc<Notify>,
}

#[allow(dead_code)]
impl FakeEventSink {
    /// Create a new empty FakeEventSink
    pub fn new() -> Self {
        FakeEventSink {
            events: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// All events emitted so far, in emission order
    pub fn fake_events(&self) -> Vec<ServerEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Clear the recorded events
    pub fn fake_clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Wait until at least `count` events have been emitted, then return
    /// them all. Panics after five seconds to keep hung tests visible.
    pub async fn fake_wait_for(&self, count: usize) -> Vec<ServerEvent> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if self.events.lock().unwrap().len() >= count {
                    return;
                }
                self.notify.notified().await;
            }
        })
        .await
        .expect("timed out waiting for events");

        self.fake_events()
    }
}

impl Default for FakeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for FakeEventSink {
    async fn emit(&self, event: ServerEvent) -> Result<(), ChannelError> {
        self.events.lock().unwrap().push(event);
        // notify_one stores a permit, so an emit landing between the
        // waiter's length check and its await is not lost.
        self.notify.notify_one();
        Ok(())
    }
}
