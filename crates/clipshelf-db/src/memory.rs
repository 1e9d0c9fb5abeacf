use async_trait::async_trait;
use clipshelf_core::models::{CreateVideoParams, StoredReference, VideoRecord};
use clipshelf_core::AppError;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::video::VideoRepository;

/// Process-local repository, selected with `DATABASE_URL=memory://`.
#[derive(Default)]
pub struct InMemoryVideoRepository {
    records: RwLock<HashMap<Uuid, VideoRecord>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create(
        &self,
        user_id: Uuid,
        params: CreateVideoParams,
    ) -> Result<VideoRecord, AppError> {
        let record = VideoRecord::new(user_id, params);
        self.records.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError> {
        let mut records: Vec<VideoRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn update(&self, record: &VideoRecord) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Video {} not found", record.id))),
        }
    }

    async fn set_video_reference(
        &self,
        id: Uuid,
        reference: &StoredReference,
    ) -> Result<VideoRecord, AppError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;
        record.set_video_reference(reference);
        Ok(record.clone())
    }

    async fn set_thumbnail_url(
        &self,
        id: Uuid,
        url: &str,
    ) -> Result<(VideoRecord, Option<String>), AppError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;
        let previous = record.thumbnail_url.take();
        record.set_thumbnail_url(url.to_string());
        Ok((record.clone(), previous))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }
}
