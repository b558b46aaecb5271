//! S3 blob store provider.
//!
//! Credentials and region come from the standard AWS environment/profile
//! chain via `aws-config`. Returned URLs use the virtual-hosted bucket
//! format.

use aws_sdk_s3::primitives::ByteStream;

use crate::{BlobStore, StorageError};

/// S3-backed blob store.
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
}

impl S3BlobStore {
    /// Build a client from the default AWS configuration chain.
    pub async fn from_env(bucket: String) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let region = config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "us-east-1".to_string());
        Self {
            client: aws_sdk_s3::Client::new(&config),
            bucket,
            region,
        }
    }

    fn object_url(&self, logical_path: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{logical_path}",
            self.bucket, self.region
        )
    }
}

#[async_trait::async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, bytes: &[u8], logical_path: &str) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(logical_path)
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(self.object_url(logical_path))
    }

    async fn get(&self, logical_path: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(logical_path)
            .send()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn delete(&self, logical_path: &str) -> Result<bool, StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(logical_path)
            .send()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(true)
    }
}
