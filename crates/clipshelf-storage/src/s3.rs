use crate::traits::{validate_key, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, ObjectStoreExt, PutMultipartOpts,
    WriteMultipart,
};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// Size of each read from the local file; parts are assembled by `WriteMultipart`.
const READ_CHUNK_BYTES: usize = 1024 * 1024;
/// Maximum number of parts uploading concurrently.
const MAX_PARTS_IN_FLIGHT: usize = 4;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the standard AWS environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl Storage for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }

    #[tracing::instrument(skip(self, path), fields(bucket = %self.bucket))]
    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> StorageResult<u64> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let location = ObjectPath::from(key);

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        let opts = PutMultipartOpts {
            attributes,
            ..Default::default()
        };

        let mut file = tokio::fs::File::open(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let upload = self
            .store
            .put_multipart_opts(&location, opts)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        let mut writer = WriteMultipart::new(upload);

        // The upload is only completed by `finish`; if this future is dropped
        // first, no object appears under `key`.
        let mut buf = vec![0u8; READ_CHUNK_BYTES];
        let mut size: u64 = 0;
        loop {
            let bytes_read = match file.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    let _ = writer.abort().await;
                    return Err(StorageError::UploadFailed(format!(
                        "Failed to read {}: {}",
                        path.display(),
                        e
                    )));
                }
            };
            if bytes_read == 0 {
                break;
            }
            if let Err(e) = writer.wait_for_capacity(MAX_PARTS_IN_FLIGHT).await {
                let _ = writer.abort().await;
                return Err(StorageError::UploadFailed(e.to_string()));
            }
            writer.write(&buf[..bytes_read]);
            size += bytes_read as u64;
        }

        writer.finish().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(size)
    }

    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        validate_key(key)?;
        let location = ObjectPath::from(key);
        let url = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        Ok(url.to_string())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let location = ObjectPath::from(key);

        match self.store.delete(&location).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let location = ObjectPath::from(key);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }
}
