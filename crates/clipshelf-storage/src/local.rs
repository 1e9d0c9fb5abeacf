use crate::traits::{validate_key, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Local filesystem storage implementation
///
/// Objects live under `base_path/{key}`. Signed URLs have the form
/// `{base_url}/{key}?expires={unix_ts}&signature={hex hmac}` and are checked
/// with [`LocalStorage::verify_signed_url`] by whoever serves `base_url`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    bucket: String,
    signing_secret: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/clipshelf/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8091/media")
    /// * `bucket` - Bucket name recorded in stored references
    /// * `signing_secret` - HMAC key for signed URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        bucket: String,
        signing_secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let signing_secret = signing_secret.into();
        if signing_secret.is_empty() {
            return Err(StorageError::ConfigError(
                "URL signing secret must not be empty".to_string(),
            ));
        }

        Ok(LocalStorage {
            base_path,
            base_url,
            bucket,
            signing_secret,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn sign(&self, key: &str, expires_at: u64) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.signing_secret).expect("HMAC accepts any key size");
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(&expires_at.to_be_bytes());
        mac
    }

    /// Check a signature produced by `presigned_get_url`.
    pub fn verify_signed_url(&self, key: &str, expires_at: u64, signature: &str) -> StorageResult<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        if now > expires_at {
            return Err(StorageError::InvalidSignature(
                "Signed URL has expired".to_string(),
            ));
        }

        let tag = hex::decode(signature)
            .map_err(|_| StorageError::InvalidSignature("Malformed signature".to_string()))?;
        self.sign(key, expires_at)
            .verify_slice(&tag)
            .map_err(|_| StorageError::InvalidSignature("Signature mismatch".to_string()))
    }

    /// Open a stored object for reading, returning the file and its length.
    pub async fn open(&self, key: &str) -> StorageResult<(fs::File, u64)> {
        let path = self.key_to_path(key)?;
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => return Err(StorageError::IoError(e)),
        };
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    fn url_for(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url.trim_end_matches('/'), encoded.join("/"))
    }
}

/// Removes a partially written file unless it was committed.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    #[tracing::instrument(skip(self, source, _content_type), fields(bucket = %self.bucket))]
    async fn put_file(&self, key: &str, source: &Path, _content_type: &str) -> StorageResult<u64> {
        let path = self.key_to_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let start = std::time::Instant::now();

        // Copy next to the target, then rename, so readers never see a partial object.
        let mut partial = PartialFile {
            path: path.with_extension(format!("{}.partial", Uuid::new_v4().simple())),
            committed: false,
        };
        let size = fs::copy(source, &partial.path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to copy {} into storage: {}",
                source.display(),
                e
            ))
        })?;
        fs::rename(&partial.path, &path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to publish {}: {}", path.display(), e))
        })?;
        partial.committed = true;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(size)
    }

    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        validate_key(key)?;
        let expires_at = SystemTime::now()
            .checked_add(expires_in)
            .unwrap_or(SystemTime::UNIX_EPOCH)
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let signature = hex::encode(self.sign(key, expires_at).finalize().into_bytes());

        Ok(format!(
            "{}?expires={}&signature={}",
            self.url_for(key),
            expires_at,
            signature
        ))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), key = %key, "Local storage delete successful");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;

    async fn storage_in(dir: &Path) -> LocalStorage {
        LocalStorage::new(
            dir.join("objects"),
            "http://localhost:8091/media".to_string(),
            "local".to_string(),
            b"test-signing-secret".to_vec(),
        )
        .await
        .unwrap()
    }

    async fn source_file(dir: &Path, contents: &[u8]) -> PathBuf {
        let path = dir.join("source.mp4");
        fs::write(&path, contents).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_local_storage_put_and_open() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let source = source_file(dir.path(), b"fake mp4 bytes").await;

        let size = storage
            .put_file("landscape/abc.mp4", &source, "video/mp4")
            .await
            .unwrap();
        assert_eq!(size, 14);
        assert!(storage.exists("landscape/abc.mp4").await.unwrap());

        let (mut file, len) = storage.open("landscape/abc.mp4").await.unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await.unwrap();
        assert_eq!(len, 14);
        assert_eq!(contents, b"fake mp4 bytes");
    }

    #[tokio::test]
    async fn test_local_storage_leaves_no_partial_files() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let source = source_file(dir.path(), b"data").await;

        storage
            .put_file("portrait/x.mp4", &source, "video/mp4")
            .await
            .unwrap();

        let mut entries = fs::read_dir(storage.base_path().join("portrait")).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["x.mp4".to_string()]);
    }

    #[tokio::test]
    async fn test_local_storage_missing_source_is_upload_error() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage
            .put_file("other/x.mp4", &dir.path().join("missing.mp4"), "video/mp4")
            .await;
        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
        assert!(!storage.exists("other/x.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_storage_path_traversal_protection() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let source = source_file(dir.path(), b"data").await;

        let result = storage
            .put_file("../../../etc/passwd", &source, "text/plain")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        assert!(storage.delete("landscape/nonexistent.mp4").await.is_ok());
    }

    #[tokio::test]
    async fn test_presigned_url_verifies() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let url = storage
            .presigned_get_url("landscape/a,b.mp4", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:8091/media/landscape/a%2Cb.mp4?expires="));

        let query = url.split_once('?').unwrap().1;
        let mut expires = 0u64;
        let mut signature = String::new();
        for pair in query.split('&') {
            match pair.split_once('=').unwrap() {
                ("expires", v) => expires = v.parse().unwrap(),
                ("signature", v) => signature = v.to_string(),
                _ => {}
            }
        }

        assert!(storage
            .verify_signed_url("landscape/a,b.mp4", expires, &signature)
            .is_ok());
        assert!(matches!(
            storage.verify_signed_url("landscape/other.mp4", expires, &signature),
            Err(StorageError::InvalidSignature(_))
        ));
        assert!(matches!(
            storage.verify_signed_url("landscape/a,b.mp4", expires + 1, &signature),
            Err(StorageError::InvalidSignature(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_signature_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let signature = hex::encode(storage.sign("k.mp4", 1).finalize().into_bytes());
        assert!(matches!(
            storage.verify_signed_url("k.mp4", 1, &signature),
            Err(StorageError::InvalidSignature(_))
        ));
    }
}
