//! `POST /api/video_upload/{video_id}`: run an upload through the pipeline
//! and point the record at the published object.

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::{
    ensure_owner, load_video, multipart_io_error, multipart_rejection, parse_video_id,
};
use crate::state::AppState;
use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    response::IntoResponse,
    Json,
};
use clipshelf_core::models::VideoView;
use clipshelf_core::AppError;
use clipshelf_processing::{UploadSession, VIDEO_SUBTYPES};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio_util::io::StreamReader;

const VIDEO_FIELD: &str = "video";

#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video published", body = VideoView),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Processing or storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = tracing::field::Empty))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    request: Request,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_video_id(&video_id)?;
    let user = AuthUser::from_headers(request.headers(), &state)?;
    tracing::Span::current().record("user_id", tracing::field::display(user.user_id));

    let record = load_video(&state, id).await?;
    ensure_owner(&record, user.user_id)?;

    let mut multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_rejection)? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let session = UploadSession::from_content_type(field.content_type(), VIDEO_SUBTYPES)?;
        let body = StreamReader::new(field.map_err(multipart_io_error));
        tokio::pin!(body);

        let published = state.pipeline.run(&session, &mut body).await?;

        // Writes only the reference column; other fields may have changed meanwhile.
        let updated = match state.videos.set_video_reference(id, &published.reference).await {
            Ok(updated) => updated,
            Err(e) => {
                // Nothing points at the object any more; remove it in the background.
                let storage = state.storage.clone();
                let key = published.reference.key().to_string();
                tokio::spawn(async move {
                    if let Err(delete_err) = storage.delete(&key).await {
                        tracing::warn!(error = %delete_err, key = %key, "Failed to remove orphaned object");
                    }
                });
                return Err(e.into());
            }
        };

        tracing::info!(
            video_id = %id,
            key = %published.reference.key(),
            aspect = ?published.aspect,
            size_bytes = published.size_bytes,
            "Video upload complete"
        );

        let view: VideoView = state.resolver.resolve(updated).await?;
        return Ok(Json(view));
    }

    Err(AppError::InvalidInput(format!("Missing '{}' field", VIDEO_FIELD)).into())
}
