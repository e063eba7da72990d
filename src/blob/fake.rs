use crate::blob::blob_store::{BlobInfo, BlobStore};
use crate::blob::error::BlobError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

#[allow(dead_code)]
struct FakeBlob {
    data: Bytes,
    created_at: DateTime<Utc>,
}

/// `FakeBlobStore` is an in-memory implementation of the `BlobStore` trait
/// for testing purposes. Every delete attempt is recorded, including ones
/// configured to fail, so tests can assert exactly-once deletion behavior.
#[derive(Clone)]
#[allow(dead_code)]
pub struct FakeBlobStore {
    blobs: Arc<Mutex<HashMap<String, FakeBlob>>>,
    fail_deletes: Arc<Mutex<HashSet<String>>>,
    delete_attempts: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl FakeBlobStore {
    /// Create a new empty FakeBlobStore instance
    pub fn new() -> Self {
        FakeBlobStore {
            blobs: Arc::new(Mutex::new(HashMap::new())),
            fail_deletes: Arc::new(Mutex::new(HashSet::new())),
            delete_attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a blob with a controlled creation time
    pub async fn fake_add_blob(&self, path: &str, data: Bytes, created_at: DateTime<Utc>) {
        let mut blobs = self.blobs.lock().await;
        blobs.insert(path.to_string(), FakeBlob { data, created_at });
    }

    /// Simulate a failure when deleting a specific path
    pub async fn fake_fail_delete(&self, path: &str) {
        let mut fail_deletes = self.fail_deletes.lock().await;
        fail_deletes.insert(path.to_string());
    }

    /// Every delete attempted so far, in order, including failed ones
    pub async fn fake_delete_attempts(&self) -> Vec<String> {
        self.delete_attempts.lock().await.clone()
    }

    /// Paths of blobs currently stored
    pub async fn fake_paths(&self) -> Vec<String> {
        let blobs = self.blobs.lock().await;
        let mut paths: Vec<String> = blobs.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Default for FakeBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn list_blobs(&self, prefix: Option<&str>) -> Result<Vec<BlobInfo>, BlobError> {
        let blobs = self.blobs.lock().await;
        let mut listed: Vec<BlobInfo> = blobs
            .iter()
            .filter(|(path, _)| prefix.map_or(true, |p| path.starts_with(p)))
            .map(|(path, blob)| BlobInfo {
                path: path.clone(),
                created_at: blob.created_at,
                size_bytes: blob.data.len() as i64,
            })
            .collect();
        listed.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(listed)
    }

    async fn delete_blob(&self, path: &str) -> Result<(), BlobError> {
        self.delete_attempts.lock().await.push(path.to_string());

        let fail_deletes = self.fail_deletes.lock().await;
        if fail_deletes.contains(path) {
            return Err(BlobError::DeleteError(
                path.to_string(),
                "simulated delete failure".to_string(),
            ));
        }
        drop(fail_deletes);

        // Deleting a missing blob is a no-op, matching S3 semantics.
        let mut blobs = self.blobs.lock().await;
        blobs.remove(path);
        Ok(())
    }

    #[cfg(test)]
    async fn add_blob(
        &self,
        path: &str,
        data: Bytes,
        created_at: DateTime<Utc>,
    ) -> Result<(), BlobError> {
        self.fake_add_blob(path, data, created_at).await;
        Ok(())
    }
}
