pub mod health;
pub mod media;
pub mod thumbnail_get;
pub mod thumbnail_upload;
pub mod video_upload;
pub mod videos;

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use clipshelf_core::models::VideoRecord;
use clipshelf_core::AppError;
use clipshelf_processing::UploadTooLarge;
use std::io;
use uuid::Uuid;

pub(crate) fn parse_video_id(raw: &str) -> Result<Uuid, HttpAppError> {
    Uuid::parse_str(raw)
        .map_err(|_| HttpAppError(AppError::InvalidInput("Invalid video ID".to_string())))
}

pub(crate) async fn load_video(state: &AppState, id: Uuid) -> Result<VideoRecord, HttpAppError> {
    state
        .videos
        .get(id)
        .await?
        .ok_or_else(|| HttpAppError(AppError::NotFound("Video not found".to_string())))
}

pub(crate) fn ensure_owner(record: &VideoRecord, user_id: Uuid) -> Result<(), HttpAppError> {
    if record.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(HttpAppError(AppError::Forbidden(
            "You are not the owner of this video".to_string(),
        )))
    }
}

/// Multipart failures while locating a field
pub(crate) fn multipart_rejection(err: MultipartError) -> HttpAppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        HttpAppError(AppError::PayloadTooLarge(err.body_text()))
    } else {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid multipart body: {}",
            err.body_text()
        )))
    }
}

/// Multipart failures while streaming a field's bytes. Body-limit hits carry
/// the [`UploadTooLarge`] marker so the pipeline reports them as 413.
pub(crate) fn multipart_io_error(err: MultipartError) -> io::Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        io::Error::new(io::ErrorKind::Other, UploadTooLarge)
    } else {
        io::Error::new(io::ErrorKind::Other, err.body_text())
    }
}

/// Content type for files we serve back, keyed by extension.
pub(crate) fn content_type_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "mp4" => "video/mp4",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpeg" || ext == "jpg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
