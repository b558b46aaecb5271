//! Local filesystem blob store.
//!
//! The development and fallback provider: blobs live under a base
//! directory mirroring their logical paths, and URLs use the `/storage/`
//! path convention served by the deployment's static file layer.

use std::path::{Path, PathBuf};

use crate::{BlobStore, StorageError};

/// Filesystem-backed blob store.
pub struct LocalBlobStore {
    base_dir: PathBuf,
}

impl LocalBlobStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn blob_path(&self, logical_path: &str) -> PathBuf {
        // Strip path traversal components; logical paths are forward-slash
        // relative keys like "faces/123.jpg".
        let sanitized: PathBuf = Path::new(logical_path)
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect();
        self.base_dir.join(sanitized)
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, bytes: &[u8], logical_path: &str) -> Result<String, StorageError> {
        let path = self.blob_path(logical_path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(format!("/storage/{logical_path}"))
    }

    async fn get(&self, logical_path: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.blob_path(logical_path);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(logical_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, logical_path: &str) -> Result<bool, StorageError> {
        let path = self.blob_path(logical_path);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let url = store.put(b"frame bytes", "faces/abc.jpg").await.unwrap();
        assert_eq!(url, "/storage/faces/abc.jpg");

        let bytes = store.get("faces/abc.jpg").await.unwrap();
        assert_eq!(bytes, b"frame bytes");
    }

    #[tokio::test]
    async fn get_of_missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let result = store.get("missing/blob.jpg").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        store.put(b"x", "thumbnails/t.jpg").await.unwrap();
        assert!(store.delete("thumbnails/t.jpg").await.unwrap());
        assert!(!store.delete("thumbnails/t.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn traversal_components_are_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        store.put(b"x", "../escape.jpg").await.unwrap();
        // The blob lands inside the base directory, not above it.
        assert!(dir.path().join("escape.jpg").exists());
    }
}
