//! `POST /api/thumbnail_upload/{video_id}`: store a thumbnail image under
//! the assets root and record its public URL.

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
use clipshelf_processing::{random_token, ScratchFile, UploadSession, THUMBNAIL_SUBTYPES};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio_util::io::StreamReader;

const THUMBNAIL_FIELD: &str = "thumbnail";

fn assets_prefix(public_base_url: &str) -> String {
    format!("{}/assets/", public_base_url.trim_end_matches('/'))
}

/// File name of a thumbnail this service stored, or `None` for foreign URLs.
pub(crate) fn owned_asset_name<'a>(public_base_url: &str, url: &'a str) -> Option<&'a str> {
    let name = url.strip_prefix(assets_prefix(public_base_url).as_str())?;
    let plain = !name.is_empty() && !name.contains('/') && !name.contains('\\') && name != "..";
    plain.then_some(name)
}

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    tag = "thumbnails",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = VideoView),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = tracing::field::Empty))]
pub async fn upload_thumbnail(
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
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let session = UploadSession::from_content_type(field.content_type(), THUMBNAIL_SUBTYPES)?;
        let file_name = format!("{}.{}", random_token()?, session.extension());
        let assets_root = &state.config.processing.assets_root;

        // Removed again unless the record update below succeeds.
        let mut stored = ScratchFile::create(assets_root.join(&file_name)).await?;
        let body = StreamReader::new(field.map_err(multipart_io_error));
        tokio::pin!(body);
        let size_bytes = stored.fill(&mut body).await?;

        let public_base_url = &state.config.base.public_base_url;
        let url = format!("{}{}", assets_prefix(public_base_url), file_name);
        let (updated, previous) = state.videos.set_thumbnail_url(id, &url).await?;
        stored.persist();

        tracing::info!(video_id = %id, file = %file_name, size_bytes, "Thumbnail stored");

        if let Some(old) = previous.as_deref().and_then(|url| owned_asset_name(public_base_url, url)) {
            if let Err(e) = tokio::fs::remove_file(assets_root.join(old)).await {
                tracing::warn!(error = %e, file = %old, "Failed to remove previous thumbnail");
            }
        }

        let view: VideoView = state.resolver.resolve(updated).await?;
        return Ok(Json(view));
    }

    Err(AppError::InvalidInput(format!("Missing '{}' field", THUMBNAIL_FIELD)).into())
}
