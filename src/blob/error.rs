use thiserror::Error;

/// Errors that can occur when interacting with blob storage
#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum BlobError {
    #[error("Failed to connect to blob storage: {0}")]
    ConnectionError(String),

    #[error("Failed to list blobs: {0}")]
    ListError(String),

    #[error("Failed to delete blob {0}: {1}")]
    DeleteError(String, String),

    #[error("Failed to write blob {0}: {1}")]
    WriteError(String, String),

    #[error("Other blob storage error: {0}")]
    Other(#[from] anyhow::Error),
}
