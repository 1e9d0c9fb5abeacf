//! Turns stored references into short-lived URLs on every read.

use clipshelf_core::models::{VideoRecord, VideoView};
use clipshelf_storage::Storage;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

pub struct ReferenceResolver {
    storage: Arc<dyn Storage>,
    ttl: Duration,
}

impl ReferenceResolver {
    pub fn new(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Build the client view of `record`, signing a fresh URL if it has a video.
    #[tracing::instrument(skip(self, record), fields(video_id = %record.id))]
    pub async fn resolve(&self, record: VideoRecord) -> PipelineResult<VideoView> {
        let reference = match record.stored_reference() {
            None => return Ok(VideoView::from_record(record, None)),
            Some(parsed) => parsed?,
        };

        if reference.bucket() != self.storage.bucket() {
            tracing::error!(
                reference_bucket = %reference.bucket(),
                bucket = %self.storage.bucket(),
                "Video reference points at a bucket this store does not serve"
            );
            return Err(PipelineError::DataIntegrity(format!(
                "Reference names unknown bucket {}",
                reference.bucket()
            )));
        }

        let url = self
            .storage
            .presigned_get_url(reference.key(), self.ttl)
            .await?;
        Ok(VideoView::from_record(record, Some(url)))
    }

    /// Resolve every record; one malformed reference fails the whole read.
    pub async fn resolve_all(&self, records: Vec<VideoRecord>) -> PipelineResult<Vec<VideoView>> {
        try_join_all(records.into_iter().map(|record| self.resolve(record))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipshelf_core::models::{CreateVideoParams, StoredReference};
    use clipshelf_storage::LocalStorage;
    use std::path::Path;
    use tempfile::tempdir;
    use uuid::Uuid;

    async fn resolver(dir: &Path) -> ReferenceResolver {
        let storage = LocalStorage::new(
            dir.join("objects"),
            "http://localhost/media".to_string(),
            "clips".to_string(),
            b"secret".to_vec(),
        )
        .await
        .unwrap();
        ReferenceResolver::new(Arc::new(storage), Duration::from_secs(3600))
    }

    fn record_with(reference: Option<&str>) -> VideoRecord {
        let mut record = VideoRecord::new(
            Uuid::new_v4(),
            CreateVideoParams {
                title: "Harbour timelapse".to_string(),
                description: String::new(),
            },
        );
        record.video_reference = reference.map(str::to_string);
        record
    }

    #[tokio::test]
    async fn test_no_reference_passes_through() {
        let dir = tempdir().unwrap();
        let view = resolver(dir.path())
            .await
            .resolve(record_with(None))
            .await
            .unwrap();
        assert!(view.video_url.is_none());
    }

    #[tokio::test]
    async fn test_resolves_key_with_comma() {
        let dir = tempdir().unwrap();
        let reference = StoredReference::new("clips", "other/a,b.mp4").unwrap();
        let view = resolver(dir.path())
            .await
            .resolve(record_with(Some(&reference.to_uri())))
            .await
            .unwrap();
        let url = view.video_url.unwrap();
        assert!(url.starts_with("http://localhost/media/other/a%2Cb.mp4?"));
    }

    #[tokio::test]
    async fn test_resolving_twice_targets_same_object() {
        let dir = tempdir().unwrap();
        let resolver = resolver(dir.path()).await;
        let uri = StoredReference::new("clips", "landscape/x.mp4").unwrap().to_uri();

        let first = resolver.resolve(record_with(Some(&uri))).await.unwrap();
        let second = resolver.resolve(record_with(Some(&uri))).await.unwrap();

        let destination = |url: Option<String>| url.unwrap().split('?').next().unwrap().to_string();
        assert_eq!(destination(first.video_url), destination(second.video_url));
    }

    #[tokio::test]
    async fn test_malformed_reference_is_data_integrity() {
        let dir = tempdir().unwrap();
        let err = resolver(dir.path())
            .await
            .resolve(record_with(Some("clips,landscape/x.mp4")))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::DataIntegrity(_)));
    }

    #[tokio::test]
    async fn test_foreign_bucket_is_data_integrity() {
        let dir = tempdir().unwrap();
        let uri = StoredReference::new("elsewhere", "landscape/x.mp4")
            .unwrap()
            .to_uri();
        let err = resolver(dir.path())
            .await
            .resolve(record_with(Some(&uri)))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::DataIntegrity(_)));
    }

    #[tokio::test]
    async fn test_resolve_all_fails_on_any_bad_record() {
        let dir = tempdir().unwrap();
        let resolver = resolver(dir.path()).await;
        let good = StoredReference::new("clips", "portrait/y.mp4").unwrap().to_uri();

        let views = resolver
            .resolve_all(vec![record_with(None), record_with(Some(&good))])
            .await
            .unwrap();
        assert_eq!(views.len(), 2);
        assert!(views[1].video_url.is_some());

        let result = resolver
            .resolve_all(vec![record_with(Some(&good)), record_with(Some("garbage"))])
            .await;
        assert!(result.is_err());
    }
}
