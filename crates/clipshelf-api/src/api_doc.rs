//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use clipshelf_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clipshelf API",
        version = "0.1.0",
        description = "Upload, publish and serve short videos with signed playback URLs"
    ),
    paths(
        handlers::health::health,
        handlers::videos::create_video,
        handlers::videos::list_videos,
        handlers::videos::get_video,
        handlers::videos::delete_video,
        handlers::video_upload::upload_video,
        handlers::thumbnail_upload::upload_thumbnail,
        handlers::thumbnail_get::get_thumbnail,
        handlers::media::serve_media,
    ),
    components(
        schemas(
            models::CreateVideoParams,
            models::VideoView,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "videos", description = "Video records and the upload pipeline"),
        (name = "thumbnails", description = "Thumbnail upload and retrieval"),
        (name = "media", description = "Signed access to locally stored objects"),
        (name = "config", description = "Health checks")
    )
)]
pub struct ApiDoc;
