use crate::blob::blob_store::{BlobInfo, BlobStore};
use crate::blob::error::BlobError;
use crate::config::BlobConfig;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::{config::Region, Client};
#[cfg(test)]
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// S3-backed implementation of the BlobStore trait
///
/// Inspection images are write-once, so the object's LastModified time is
/// its creation time.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a new S3BlobStore instance from configuration
    pub async fn new(config: &BlobConfig) -> Result<Self, BlobError> {
        // Set up AWS SDK config
        let config_loader = aws_config::from_env().region(Region::new(config.region.clone()));

        // If access key and secret are provided, use them for credentials
        let aws_config = if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "StaticCredentialsProvider",
            );

            config_loader.credentials_provider(credentials).load().await
        } else {
            config_loader.load().await
        };

        // Create S3 client with endpoint override if provided
        let mut client_builder = aws_sdk_s3::config::Builder::from(&aws_config);
        if let Some(endpoint) = &config.endpoint {
            client_builder = client_builder.endpoint_url(endpoint);
        }

        let s3_config = client_builder.build();
        let client = Client::from_conf(s3_config);

        info!("Connected to S3 in region {}", config.region);

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn list_blobs(&self, prefix: Option<&str>) -> Result<Vec<BlobInfo>, BlobError> {
        debug!("Listing blobs with prefix: {:?}", prefix);

        let mut blobs = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);
            if let Some(prefix) = prefix {
                request = request.prefix(prefix);
            }
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| BlobError::ListError(e.to_string()))?;

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                let Some(last_modified) = object.last_modified() else {
                    debug!("Blob {key} has no creation time, skipping");
                    continue;
                };
                let Some(created_at) = DateTime::<Utc>::from_timestamp(
                    last_modified.secs(),
                    last_modified.subsec_nanos(),
                ) else {
                    debug!("Blob {key} has an unrepresentable creation time, skipping");
                    continue;
                };

                blobs.push(BlobInfo {
                    path: key.to_string(),
                    created_at,
                    size_bytes: object.size().unwrap_or(0),
                });
            }

            if response.is_truncated() == Some(true) {
                continuation = response.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        debug!("Listed {} blobs", blobs.len());
        Ok(blobs)
    }

    async fn delete_blob(&self, path: &str) -> Result<(), BlobError> {
        debug!("Deleting blob: {path}");

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| BlobError::DeleteError(path.to_string(), e.to_string()))?;

        Ok(())
    }

    #[cfg(test)]
    async fn add_blob(
        &self,
        path: &str,
        data: Bytes,
        _created_at: DateTime<Utc>,
    ) -> Result<(), BlobError> {
        // S3 assigns the creation time itself; the parameter only matters
        // for the fake.
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(aws_sdk_s3::primitives::ByteStream::from(data))
            .send()
            .await
            .map_err(|e| BlobError::WriteError(path.to_string(), e.to_string()))?;

        Ok(())
    }
}
