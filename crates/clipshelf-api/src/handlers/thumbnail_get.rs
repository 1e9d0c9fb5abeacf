use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::thumbnail_upload::owned_asset_name;
use crate::handlers::{content_type_for, load_video, parse_video_id};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use clipshelf_core::AppError;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

fn thumbnail_not_found() -> HttpAppError {
    HttpAppError(AppError::NotFound("Thumbnail not found".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/thumbnails/{video_id}",
    tag = "thumbnails",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Thumbnail image"),
        (status = 400, description = "Invalid video ID", body = ErrorResponse),
        (status = 404, description = "Video or thumbnail not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_video_id(&video_id)?;
    let record = load_video(&state, id).await?;

    let url = record.thumbnail_url.as_deref().ok_or_else(thumbnail_not_found)?;
    let name = owned_asset_name(&state.config.base.public_base_url, url).ok_or_else(|| {
        tracing::debug!(url = %url, "Thumbnail URL is not served from the assets root");
        thumbnail_not_found()
    })?;

    let path = state.config.processing.assets_root.join(name);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(thumbnail_not_found()),
        Err(e) => {
            return Err(AppError::Storage(format!("Failed to open thumbnail: {}", e)).into())
        }
    };
    let len = file
        .metadata()
        .await
        .map_err(|e| AppError::Storage(format!("Failed to stat thumbnail: {}", e)))?
        .len();

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(name).to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    ))
}
