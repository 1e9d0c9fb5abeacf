//! Test helpers: build AppState and router for integration tests.
//!
//! The app runs against an in-memory repository, local storage in a temp
//! directory and scripted ffmpeg/ffprobe, so no external services are needed.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use clipshelf_api::auth::issue_access_token;
use clipshelf_api::setup::{prepare_directories, routes, services};
use clipshelf_api::state::AppState;
use clipshelf_core::models::VideoView;
use clipshelf_core::{BaseConfig, Config, ProcessingConfig, StorageBackend, StorageConfig};
use clipshelf_db::InMemoryVideoRepository;
use clipshelf_processing::testing::ScriptedMediaTools;
use clipshelf_storage::LocalStorage;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";
pub const PUBLIC_BASE_URL: &str = "http://localhost";
pub const MEDIA_BASE_URL: &str = "http://localhost/media";
pub const BUCKET: &str = "clips";

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub tools: Arc<ScriptedMediaTools>,
    pub scratch_dir: PathBuf,
    pub objects_dir: PathBuf,
    pub assets_dir: PathBuf,
    _root: TempDir,
}

fn test_config(root: &Path, max_video_size_bytes: usize, environment: &str) -> Config {
    Config {
        base: BaseConfig {
            server_port: 8091,
            environment: environment.to_string(),
            cors_origins: vec!["*".to_string()],
            jwt_secret: TEST_JWT_SECRET.to_string(),
            database_url: "memory://".to_string(),
            db_max_connections: 1,
            public_base_url: PUBLIC_BASE_URL.to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: Some(root.join("objects").display().to_string()),
            local_storage_base_url: Some(MEDIA_BASE_URL.to_string()),
            local_storage_bucket: BUCKET.to_string(),
            url_signing_secret: "test-url-signing-secret".to_string(),
            presigned_url_ttl_secs: 3600,
        },
        processing: ProcessingConfig {
            ffmpeg_path: "/usr/bin/ffmpeg".to_string(),
            ffprobe_path: "/usr/bin/ffprobe".to_string(),
            process_timeout_secs: 5,
            scratch_dir: root.join("scratch"),
            assets_root: root.join("assets"),
            max_video_size_bytes,
            max_thumbnail_size_bytes: 1024 * 1024,
        },
    }
}

/// Setup a test app whose media tools report a 1280x720 video.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(ScriptedMediaTools::new(1280, 720), 8 * 1024 * 1024).await
}

pub async fn setup_test_app_with(tools: ScriptedMediaTools, max_video_size_bytes: usize) -> TestApp {
    build_test_app(tools, max_video_size_bytes, "test").await
}

/// Setup a test app configured as a production deployment.
pub async fn setup_production_app() -> TestApp {
    build_test_app(ScriptedMediaTools::new(1280, 720), 8 * 1024 * 1024, "production").await
}

async fn build_test_app(
    tools: ScriptedMediaTools,
    max_video_size_bytes: usize,
    environment: &str,
) -> TestApp {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let config = test_config(root.path(), max_video_size_bytes, environment);
    prepare_directories(&config)
        .await
        .expect("Failed to create app directories");

    let storage = Arc::new(
        LocalStorage::new(
            root.path().join("objects"),
            MEDIA_BASE_URL.to_string(),
            BUCKET.to_string(),
            config.storage.url_signing_secret.as_bytes().to_vec(),
        )
        .await
        .expect("Failed to create local storage"),
    );

    let tools = Arc::new(tools);
    let state = services::build_state(
        config.clone(),
        Arc::new(InMemoryVideoRepository::new()),
        storage.clone(),
        Some(storage),
        tools.clone(),
    );
    let router = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        tools,
        scratch_dir: config.processing.scratch_dir.clone(),
        objects_dir: root.path().join("objects"),
        assets_dir: config.processing.assets_root.clone(),
        _root: root,
    }
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        issue_access_token(user_id, TEST_JWT_SECRET, Duration::from_secs(600))
            .expect("Failed to issue token")
    }

    pub fn bearer(&self, user_id: Uuid) -> String {
        format!("Bearer {}", self.token_for(user_id))
    }

    /// Create a record owned by `user_id` through the API.
    pub async fn create_video(&self, user_id: Uuid, title: &str) -> VideoView {
        let response = self
            .server
            .post("/api/videos")
            .add_header("Authorization", self.bearer(user_id))
            .json(&json!({ "title": title, "description": "" }))
            .await;
        assert_eq!(response.status_code(), 201);
        response.json::<VideoView>()
    }
}

pub fn video_form(bytes: &[u8], content_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "video",
        Part::bytes(bytes.to_vec())
            .file_name("clip.mp4")
            .mime_type(content_type),
    )
}

pub fn thumbnail_form(bytes: &[u8], content_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "thumbnail",
        Part::bytes(bytes.to_vec())
            .file_name("thumb")
            .mime_type(content_type),
    )
}

/// Number of regular files under `dir`, recursively.
pub fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

/// Split a signed local URL into the request path and its query string.
pub fn split_signed_url(url: &str) -> (String, String) {
    let relative = url
        .strip_prefix(PUBLIC_BASE_URL)
        .expect("Signed URL is not served by this app");
    let (path, query) = relative.split_once('?').expect("Signed URL has no query");
    (path.to_string(), query.to_string())
}
