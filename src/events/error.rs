use thiserror::Error;

/// Errors that can occur when emitting events to the push channel
#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum ChannelError {
    #[error("Failed to emit event: {0}")]
    EmitError(String),
}
