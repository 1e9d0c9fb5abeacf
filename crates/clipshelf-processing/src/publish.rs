use clipshelf_core::models::StoredReference;
use clipshelf_storage::Storage;
use std::path::Path;
use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};
use crate::keys::StorageKey;

/// Uploads processed files to the configured object store.
pub struct Publisher {
    storage: Arc<dyn Storage>,
}

impl Publisher {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Stream `path` to `key` and return where it ended up.
    ///
    /// Nothing is written to metadata here; callers persist the returned
    /// reference only after this succeeds.
    #[tracing::instrument(skip(self, path, key), fields(bucket = %self.storage.bucket(), key = %key))]
    pub async fn publish(
        &self,
        path: &Path,
        key: &StorageKey,
        content_type: &str,
    ) -> PipelineResult<StoredReference> {
        // Checked before the upload so a bad bucket never leaves an object behind.
        let reference = StoredReference::new(self.storage.bucket(), key.as_str())
            .map_err(|e| PipelineError::Internal(e.to_string()))?;

        let size = self
            .storage
            .put_file(key.as_str(), path, content_type)
            .await?;

        tracing::info!(size_bytes = size, "Video published");
        Ok(reference)
    }
}
