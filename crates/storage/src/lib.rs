//! Content-addressed blob storage for evidence bytes and derived images.
//!
//! The [`BlobStore`] trait is the provider seam: S3 in production, the
//! local filesystem in development, and [`FallbackBlobStore`] composing
//! both so a flaky object store degrades to the local path convention
//! instead of failing uploads.

pub mod local;
pub mod s3;

use std::sync::Arc;

pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

/// Error type for blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("blob store unavailable: {0}")]
    Unavailable(String),

    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A blob storage provider.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes at a logical path, returning a retrievable URL.
    async fn put(&self, bytes: &[u8], logical_path: &str) -> Result<String, StorageError>;

    /// Fetch the bytes stored at a logical path.
    async fn get(&self, logical_path: &str) -> Result<Vec<u8>, StorageError>;

    /// Delete a blob. Returns `false` when it did not exist.
    async fn delete(&self, logical_path: &str) -> Result<bool, StorageError>;
}

// ---------------------------------------------------------------------------
// Fallback composition
// ---------------------------------------------------------------------------

/// Primary store with a local filesystem fallback.
///
/// Writes try the primary first and degrade to the fallback on failure;
/// reads consult the primary then the fallback.
pub struct FallbackBlobStore {
    primary: Arc<dyn BlobStore>,
    fallback: Arc<dyn BlobStore>,
}

impl FallbackBlobStore {
    pub fn new(primary: Arc<dyn BlobStore>, fallback: Arc<dyn BlobStore>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait::async_trait]
impl BlobStore for FallbackBlobStore {
    async fn put(&self, bytes: &[u8], logical_path: &str) -> Result<String, StorageError> {
        match self.primary.put(bytes, logical_path).await {
            Ok(url) => Ok(url),
            Err(e) => {
                tracing::warn!(
                    logical_path,
                    error = %e,
                    "Primary blob store put failed, falling back to local storage"
                );
                self.fallback.put(bytes, logical_path).await
            }
        }
    }

    async fn get(&self, logical_path: &str) -> Result<Vec<u8>, StorageError> {
        match self.primary.get(logical_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                tracing::warn!(
                    logical_path,
                    error = %e,
                    "Primary blob store get failed, trying local fallback"
                );
                self.fallback.get(logical_path).await
            }
        }
    }

    async fn delete(&self, logical_path: &str) -> Result<bool, StorageError> {
        let primary = self.primary.delete(logical_path).await.unwrap_or(false);
        let fallback = self.fallback.delete(logical_path).await.unwrap_or(false);
        Ok(primary || fallback)
    }
}

// ---------------------------------------------------------------------------
// Environment wiring
// ---------------------------------------------------------------------------

/// Build the blob store from environment configuration.
///
/// | Env Var             | Effect                                        |
/// |---------------------|-----------------------------------------------|
/// | `S3_BUCKET`         | When set: S3 primary with local fallback      |
/// | `STORAGE_BASE_DIR`  | Local store root (default `/var/lib/custodia`)|
pub async fn from_env() -> Arc<dyn BlobStore> {
    let base_dir = std::env::var("STORAGE_BASE_DIR")
        .unwrap_or_else(|_| "/var/lib/custodia".to_string());
    let local: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(base_dir));

    match std::env::var("S3_BUCKET") {
        Ok(bucket) if !bucket.is_empty() => {
            let s3: Arc<dyn BlobStore> = Arc::new(S3BlobStore::from_env(bucket).await);
            Arc::new(FallbackBlobStore::new(s3, local))
        }
        _ => local,
    }
}
