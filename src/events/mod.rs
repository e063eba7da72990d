pub mod channel;
pub mod error;
pub mod fake;
pub mod models;
#[cfg(test)]
mod tests;

pub use channel::{BroadcastChannel, EventSink};
#[allow(unused_imports)]
pub use error::ChannelError;
pub use fake::FakeEventSink;
pub use models::ServerEvent;
