//! Route configuration and setup

use crate::handlers;
use crate::middleware;
use crate::state::AppState;
use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use clipshelf_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and part headers on top of the file limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let video_limit = config.processing.max_video_size_bytes + MULTIPART_OVERHEAD_BYTES;
    let thumbnail_limit = config.processing.max_thumbnail_size_bytes + MULTIPART_OVERHEAD_BYTES;

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .route(
            "/api/videos",
            post(handlers::videos::create_video).get(handlers::videos::list_videos),
        )
        .route(
            "/api/videos/{video_id}",
            get(handlers::videos::get_video).delete(handlers::videos::delete_video),
        )
        .route(
            "/api/video_upload/{video_id}",
            post(handlers::video_upload::upload_video).layer(DefaultBodyLimit::max(video_limit)),
        )
        .route(
            "/api/thumbnail_upload/{video_id}",
            post(handlers::thumbnail_upload::upload_thumbnail)
                .layer(DefaultBodyLimit::max(thumbnail_limit)),
        )
        .route(
            "/api/thumbnails/{video_id}",
            get(handlers::thumbnail_get::get_thumbnail),
        )
        .route("/media/{*key}", get(handlers::media::serve_media))
        .nest_service(
            "/assets",
            ServeDir::new(&config.processing.assets_root),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::error_details_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(video_limit.max(thumbnail_limit)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    let cors = if config.base.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .base
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid CORS origin")?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
