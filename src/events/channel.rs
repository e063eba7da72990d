use crate::events::error::ChannelError;
use crate::events::models::ServerEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// EventSink trait defining the producer side of the push channel
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    /// Emit one event to all connected subscribers
    async fn emit(&self, event: ServerEvent) -> Result<(), ChannelError>;
}

/// Implementation of EventSink trait for Arc<T> where T implements EventSink
#[async_trait]
impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    async fn emit(&self, event: ServerEvent) -> Result<(), ChannelError> {
        (**self).emit(event).await
    }
}

/// In-process fan-out channel backed by tokio broadcast
///
/// The presentation transport subscribes here and forwards each event to its
/// connected clients. Emitting with nobody subscribed is not an error.
pub struct BroadcastChannel {
    sender: broadcast::Sender<ServerEvent>,
}

impl BroadcastChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        BroadcastChannel { sender }
    }

    /// Register a subscriber. Dropping the receiver unsubscribes.
    #[allow(dead_code)]
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventSink for BroadcastChannel {
    async fn emit(&self, event: ServerEvent) -> Result<(), ChannelError> {
        match self.sender.send(event) {
            Ok(subscribers) => {
                trace!("Delivered event to {subscribers} subscribers");
            }
            Err(broadcast::error::SendError(event)) => {
                debug!("No subscribers connected, dropping {} event", event.name());
            }
        }
        Ok(())
    }
}
