use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::reference::{ReferenceError, StoredReference};

/// Persisted video metadata.
///
/// `video_reference` holds the canonical URI of a [`StoredReference`] once a
/// file has been published; it is never exposed to clients directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VideoRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(user_id: Uuid, params: CreateVideoParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: params.title,
            description: params.description,
            thumbnail_url: None,
            video_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Decode the persisted reference, if any.
    pub fn stored_reference(&self) -> Option<Result<StoredReference, ReferenceError>> {
        self.video_reference.as_deref().map(StoredReference::parse)
    }

    /// Overwrite the video reference after a successful publish.
    pub fn set_video_reference(&mut self, reference: &StoredReference) {
        self.video_reference = Some(reference.to_uri());
        self.updated_at = Utc::now();
    }

    pub fn set_thumbnail_url(&mut self, url: String) {
        self.thumbnail_url = Some(url);
        self.updated_at = Utc::now();
    }
}

/// Request body for creating a video record
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateVideoParams {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Read model returned to clients: the stored reference is replaced by a
/// short-lived signed URL.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoView {
    pub fn from_record(record: VideoRecord, video_url: Option<String>) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            title: record.title,
            description: record.description,
            thumbnail_url: record.thumbnail_url,
            video_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CreateVideoParams {
        CreateVideoParams {
            title: "Weekend hike".to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_new_record_has_no_media() {
        let owner = Uuid::new_v4();
        let record = VideoRecord::new(owner, params());
        assert!(record.is_owned_by(owner));
        assert!(!record.is_owned_by(Uuid::new_v4()));
        assert!(record.stored_reference().is_none());
        assert!(record.thumbnail_url.is_none());
    }

    #[test]
    fn test_set_video_reference_overwrites_previous() {
        let mut record = VideoRecord::new(Uuid::new_v4(), params());
        let first = StoredReference::new("videos", "landscape/a.mp4").unwrap();
        let second = StoredReference::new("videos", "portrait/b.mp4").unwrap();

        record.set_video_reference(&first);
        record.set_video_reference(&second);

        let decoded = record.stored_reference().unwrap().unwrap();
        assert_eq!(decoded, second);
    }

    #[test]
    fn test_malformed_reference_surfaces_error() {
        let mut record = VideoRecord::new(Uuid::new_v4(), params());
        record.video_reference = Some("videos,landscape/a.mp4".to_string());
        assert!(record.stored_reference().unwrap().is_err());
    }

    #[test]
    fn test_view_never_exposes_reference() {
        let mut record = VideoRecord::new(Uuid::new_v4(), params());
        record.set_video_reference(&StoredReference::new("videos", "other/x.mp4").unwrap());
        let view = VideoView::from_record(record, Some("https://signed".to_string()));
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("video_reference").is_none());
        assert_eq!(json["video_url"], "https://signed");
    }
}
