//! Serves objects from local storage behind signed URLs.

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::content_type_for;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use clipshelf_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

#[derive(Debug, Deserialize)]
pub struct SignedUrlQuery {
    pub expires: Option<u64>,
    pub signature: Option<String>,
}

#[utoipa::path(
    get,
    path = "/media/{key}",
    tag = "media",
    params(
        ("key" = String, Path, description = "Object key"),
        ("expires" = u64, Query, description = "Expiry as a Unix timestamp"),
        ("signature" = String, Query, description = "Hex HMAC-SHA256 signature")
    ),
    responses(
        (status = 200, description = "Object contents"),
        (status = 403, description = "Missing, expired or invalid signature", body = ErrorResponse),
        (status = 404, description = "Object not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query))]
pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<SignedUrlQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let local = state
        .local_media
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Media is not served by this instance".to_string()))?;

    let (Some(expires), Some(signature)) = (query.expires, query.signature.as_deref()) else {
        return Err(AppError::Forbidden("Missing URL signature".to_string()).into());
    };
    local.verify_signed_url(&key, expires, signature)?;

    let (file, len) = local.open(&key).await?;
    tracing::debug!(size_bytes = len, "Serving media object");

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&key).to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    ))
}
