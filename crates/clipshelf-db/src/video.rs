use async_trait::async_trait;
use clipshelf_core::models::{CreateVideoParams, StoredReference, VideoRecord};
use clipshelf_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const VIDEO_COLUMNS: &str =
    "id, user_id, title, description, thumbnail_url, video_reference, created_at, updated_at";

/// Persistence for video metadata
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, params: CreateVideoParams)
        -> Result<VideoRecord, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError>;

    /// Newest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError>;

    /// Overwrite every mutable column from `record`. A missing row is
    /// `NotFound`. Handlers that did slow work since reading the record use
    /// the targeted setters below instead.
    async fn update(&self, record: &VideoRecord) -> Result<(), AppError>;

    /// Point the record at a published object, leaving every other column
    /// alone. Returns the updated record; a missing row is `NotFound`.
    async fn set_video_reference(
        &self,
        id: Uuid,
        reference: &StoredReference,
    ) -> Result<VideoRecord, AppError>;

    /// Replace the thumbnail URL. Returns the updated record together with
    /// the URL it replaced.
    async fn set_thumbnail_url(
        &self,
        id: Uuid,
        url: &str,
    ) -> Result<(VideoRecord, Option<String>), AppError>;

    /// Returns whether a row was removed
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(sqlx::FromRow)]
struct ThumbnailSwapRow {
    #[sqlx(flatten)]
    record: VideoRecord,
    previous_thumbnail_url: Option<String>,
}

#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self, params), fields(db.table = "videos", db.operation = "insert"))]
    async fn create(
        &self,
        user_id: Uuid,
        params: CreateVideoParams,
    ) -> Result<VideoRecord, AppError> {
        let record = VideoRecord::new(user_id, params);

        let created = sqlx::query_as::<Postgres, VideoRecord>(&format!(
            r#"
            INSERT INTO videos (id, user_id, title, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, VideoRecord>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError> {
        let records = sqlx::query_as::<Postgres, VideoRecord>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    #[tracing::instrument(skip(self, record), fields(db.table = "videos", db.operation = "update", db.record_id = %record.id))]
    async fn update(&self, record: &VideoRecord) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET title = $2, description = $3, thumbnail_url = $4,
                video_reference = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.thumbnail_url)
        .bind(&record.video_reference)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Video {} not found", record.id)));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, reference), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_video_reference(
        &self,
        id: Uuid,
        reference: &StoredReference,
    ) -> Result<VideoRecord, AppError> {
        let record = sqlx::query_as::<Postgres, VideoRecord>(&format!(
            r#"
            UPDATE videos
            SET video_reference = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(reference.to_uri())
        .fetch_optional(&self.pool)
        .await?;

        record.ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }

    #[tracing::instrument(skip(self, url), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_thumbnail_url(
        &self,
        id: Uuid,
        url: &str,
    ) -> Result<(VideoRecord, Option<String>), AppError> {
        let row = sqlx::query_as::<Postgres, ThumbnailSwapRow>(
            r#"
            WITH previous AS (
                SELECT id, thumbnail_url FROM videos WHERE id = $1 FOR UPDATE
            )
            UPDATE videos
            SET thumbnail_url = $2, updated_at = NOW()
            FROM previous
            WHERE videos.id = previous.id
            RETURNING videos.id, videos.user_id, videos.title, videos.description,
                      videos.thumbnail_url, videos.video_reference, videos.created_at,
                      videos.updated_at, previous.thumbnail_url AS previous_thumbnail_url
            "#,
        )
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| (row.record, row.previous_thumbnail_url))
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
