//! Video record API integration tests.
//!
//! Run with: `cargo test -p clipshelf-api --test videos_test`

mod helpers;

use clipshelf_core::models::VideoView;
use helpers::{setup_production_app, setup_test_app};
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_health() {
    let app = setup_test_app().await;
    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn test_create_list_and_get_video() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();

    let created = app.create_video(owner, "Weekend hike").await;
    assert_eq!(created.user_id, owner);
    assert_eq!(created.title, "Weekend hike");
    assert!(created.video_url.is_none());

    let second = app.create_video(owner, "Harbour at dusk").await;
    app.create_video(Uuid::new_v4(), "Someone else's").await;

    let response = app
        .client()
        .get("/api/videos")
        .add_header("Authorization", app.bearer(owner))
        .await;
    assert_eq!(response.status_code(), 200);
    let listed = response.json::<Vec<VideoView>>();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);

    let response = app
        .client()
        .get(&format!("/api/videos/{}", created.id))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<VideoView>().id, created.id);
}

#[tokio::test]
async fn test_create_requires_auth() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .post("/api/videos")
        .json(&json!({ "title": "No token" }))
        .await;
    assert_eq!(response.status_code(), 401);
    assert_eq!(response.json::<Value>()["code"], "UNAUTHORIZED");

    let response = app
        .client()
        .post("/api/videos")
        .add_header("Authorization", "Bearer not-a-jwt")
        .json(&json!({ "title": "Bad token" }))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_create_rejects_blank_title_and_bad_json() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();

    let response = app
        .client()
        .post("/api/videos")
        .add_header("Authorization", app.bearer(owner))
        .json(&json!({ "title": "   " }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = app
        .client()
        .post("/api/videos")
        .add_header("Authorization", app.bearer(owner))
        .json(&json!({ "description": "no title" }))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_error_details_depend_on_environment() {
    let app = setup_test_app().await;
    let response = app.client().get(&format!("/api/videos/{}", Uuid::new_v4())).await;
    assert_eq!(response.status_code(), 404);
    let body = response.json::<Value>();
    assert_eq!(body["error_type"], "NotFound");
    assert!(body.get("details").is_some());

    let app = setup_production_app().await;
    let response = app.client().get(&format!("/api/videos/{}", Uuid::new_v4())).await;
    assert_eq!(response.status_code(), 404);
    let body = response.json::<Value>();
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(body.get("details").is_none());
    assert!(body.get("error_type").is_none());
}

#[tokio::test]
async fn test_get_video_invalid_and_unknown_id() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/videos/not-a-uuid").await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["error"], "Invalid video ID");

    let response = app
        .client()
        .get(&format!("/api/videos/{}", Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_delete_video() {
    let app = setup_test_app().await;
    let owner = Uuid::new_v4();
    let video = app.create_video(owner, "Short lived").await;

    let response = app
        .client()
        .delete(&format!("/api/videos/{}", video.id))
        .add_header("Authorization", app.bearer(Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = app
        .client()
        .delete(&format!("/api/videos/{}", video.id))
        .add_header("Authorization", app.bearer(owner))
        .await;
    assert_eq!(response.status_code(), 204);

    let response = app
        .client()
        .get(&format!("/api/videos/{}", video.id))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = setup_test_app().await;
    let response = app.client().get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let doc = response.json::<Value>();
    assert!(doc["paths"]["/api/video_upload/{video_id}"].is_object());
}
