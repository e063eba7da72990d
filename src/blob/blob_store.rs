use crate::blob::error::BlobError;
use async_trait::async_trait;
#[cfg(test)]
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Metadata for one stored blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub size_bytes: i64,
}

/// BlobStore trait defining the interface to inspection image storage
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Enumerate blobs, optionally restricted to a path prefix, with their
    /// storage-reported creation times
    async fn list_blobs(&self, prefix: Option<&str>) -> Result<Vec<BlobInfo>, BlobError>;

    /// Delete a blob by path
    async fn delete_blob(&self, path: &str) -> Result<(), BlobError>;

    /// Add a blob (test-only)
    #[cfg(test)]
    async fn add_blob(
        &self,
        path: &str,
        data: Bytes,
        created_at: DateTime<Utc>,
    ) -> Result<(), BlobError>;
}

/// Implementation of BlobStore trait for Arc<T> where T implements BlobStore
///
/// This allows sharing blob store instances across tasks and components
/// efficiently.
#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn list_blobs(&self, prefix: Option<&str>) -> Result<Vec<BlobInfo>, BlobError> {
        (**self).list_blobs(prefix).await
    }

    async fn delete_blob(&self, path: &str) -> Result<(), BlobError> {
        (**self).delete_blob(path).await
    }

    #[cfg(test)]
    async fn add_blob(
        &self,
        path: &str,
        data: Bytes,
        created_at: DateTime<Utc>,
    ) -> Result<(), BlobError> {
        (**self).add_blob(path, data, created_at).await
    }
}
