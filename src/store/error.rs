use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by record store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing database could not be opened or its schema prepared
    #[error("could not open inspection store at {path}: {reason}")]
    Open { path: String, reason: String },

    /// No inspection with this id exists
    #[error("inspection {0} not found")]
    NotFound(Uuid),

    /// A read, write, or delete against the backing store failed
    #[error("inspection store {op} failed: {reason}")]
    Query { op: &'static str, reason: String },

    /// A stored row could not be decoded into a record
    #[error("corrupt inspection data: {0}")]
    Corrupt(String),

    /// The connection is unusable after a panic while it was held
    #[error("inspection store connection poisoned")]
    Poisoned,
}
