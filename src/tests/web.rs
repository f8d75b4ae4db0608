use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::tests::app::create_app;
use crate::web::router;

fn test_router() -> (axum::Router, tempfile::TempDir) {
    let (app, tmp) = create_app();
    (router(Arc::new(app)), tmp)
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_and_search() {
    let (router, _tmp) = test_router();

    let response = router
        .clone()
        .oneshot(json_request(
            "/api/videos/create",
            serde_json::json!({
                "url": "https://youtu.be/dQw4w9WgXcQ",
                "title": "never gonna",
                "no_meta": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["title"], "never gonna");
    assert_eq!(created["platform"], "youtube");

    let response = router
        .clone()
        .oneshot(json_request(
            "/api/videos/search",
            serde_json::json!({ "title": "gonna" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let found = body_json(response).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_favorite_unknown_video_is_404() {
    let (router, _tmp) = test_router();

    let response = router
        .oneshot(json_request(
            "/api/videos/favorite",
            serde_json::json!({ "id": "missing" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_roundtrip() {
    let (router, _tmp) = test_router();

    let response = router
        .clone()
        .oneshot(json_request(
            "/api/categories/create",
            serde_json::json!({ "name": "Comedy", "emoji": "😂", "color": "bg-red-500" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/categories")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let categories = body_json(response).await;
    assert_eq!(categories[0]["name"], "Comedy");
}

#[tokio::test]
async fn test_import_validation_error_is_400() {
    let (router, _tmp) = test_router();

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/backup/import")
                .body(Body::from(r#"{"videos": []}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_then_export() {
    let (router, _tmp) = test_router();

    let backup = r#"{
  "categories": [
    { "name": "Comedy", "emoji": "😂", "color": "bg-red-500" }
  ],
  "videos": [
    {
      "title": "clip",
      "thumbnailUrl": "https://x/y.jpg",
      "platform": "youtube",
      "duration": "0:30",
      "isFavorite": false,
      "originalUrl": "https://youtube.com/watch?v=1",
      "categoryName": "Comedy"
    }
  ]
}"#;

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/backup/import")
                .body(Body::from(backup))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["categories_restored"], 1);
    assert_eq!(summary["videos_restored"], 1);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/backup/export")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("_backup_"));

    let exported = body_json(response).await;
    assert_eq!(exported["videos"][0]["categoryName"], "Comedy");
    assert_eq!(exported["videos"][0]["thumbnailUrl"], "https://x/y.jpg");
}
