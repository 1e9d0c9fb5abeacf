//! Video record CRUD.

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::thumbnail_upload::owned_asset_name;
use crate::handlers::{ensure_owner, load_video, parse_video_id};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use clipshelf_core::models::{CreateVideoParams, VideoView};
use clipshelf_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/videos",
    tag = "videos",
    request_body = CreateVideoParams,
    responses(
        (status = 201, description = "Video record created", body = VideoView),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, params), fields(user_id = %user.user_id))]
pub async fn create_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(params): ValidatedJson<CreateVideoParams>,
) -> Result<impl IntoResponse, HttpAppError> {
    if params.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()).into());
    }

    let record = state.videos.create(user.user_id, params).await?;
    tracing::info!(video_id = %record.id, "Video record created");

    let view = state.resolver.resolve(record).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    responses(
        (status = 200, description = "The caller's videos, newest first", body = Vec<VideoView>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let records = state.videos.list_for_user(user.user_id).await?;
    let views = state.resolver.resolve_all(records).await?;
    Ok(Json(views))
}

#[utoipa::path(
    get,
    path = "/api/videos/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video with a freshly signed URL", body = VideoView),
        (status = 400, description = "Invalid video ID", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_video_id(&video_id)?;
    let record = load_video(&state, id).await?;
    let view = state.resolver.resolve(record).await?;
    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/api/videos/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 400, description = "Invalid video ID", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers))]
pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_video_id(&video_id)?;
    let user = AuthUser::from_headers(&headers, &state)?;
    let record = load_video(&state, id).await?;
    ensure_owner(&record, user.user_id)?;

    if !state.videos.delete(id).await? {
        return Err(AppError::NotFound("Video not found".to_string()).into());
    }
    tracing::info!(video_id = %id, "Video record deleted");

    // Object cleanup is best-effort; the record is already gone.
    match record.stored_reference() {
        Some(Ok(reference)) if reference.bucket() == state.storage.bucket() => {
            if let Err(e) = state.storage.delete(reference.key()).await {
                tracing::warn!(
                    error = %e,
                    key = %reference.key(),
                    "Failed to delete stored video object"
                );
            }
        }
        Some(Ok(reference)) => {
            tracing::warn!(
                bucket = %reference.bucket(),
                key = %reference.key(),
                "Skipping delete of object in a foreign bucket"
            );
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Stored reference is malformed, nothing to delete");
        }
        None => {}
    }

    if let Some(file) = record
        .thumbnail_url
        .as_deref()
        .and_then(|url| owned_asset_name(&state.config.base.public_base_url, url))
    {
        if let Err(e) = tokio::fs::remove_file(state.config.processing.assets_root.join(file)).await {
            tracing::warn!(error = %e, file = %file, "Failed to delete thumbnail file");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
