//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid or expired signature: {0}")]
    InvalidSignature(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// A backend is bound to exactly one bucket. Published objects are addressed
/// by `(bucket(), key)`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Bucket this backend writes to and signs URLs for
    fn bucket(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Stream a local file to `key`, recording `content_type` on the object.
    ///
    /// The object only becomes visible once the whole file has been written;
    /// dropping the returned future before completion leaves nothing behind
    /// under `key`. Returns the number of bytes uploaded.
    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> StorageResult<u64>;

    /// Generate a presigned/temporary URL for direct access (GET)
    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;
}

/// Reject keys that could escape a bucket or filesystem root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("landscape/abc.mp4").is_ok());
        assert!(validate_key("other/a,b.mp4").is_ok());
        assert!(matches!(validate_key(""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(
            validate_key("/etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_key("landscape/../../secret"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
