//! Routing and static results integration tests.

mod common;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use centroid_finder_server::{HandlerRequest, HandlerSet};
use common::TestServer;
use serde_json::Value;

#[tokio::test]
async fn test_landing_page() {
    let server = TestServer::start().await;

    let response = server.client().get(server.url("/")).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    assert!(body.contains("Centroid Finder API is running"));
    for pattern in [
        "/api/videos",
        "/thumbnail/:filename",
        "/process/:filename",
        "/process/:jobId/status",
    ] {
        assert!(body.contains(pattern), "landing page is missing {}", pattern);
    }
}

#[tokio::test]
async fn test_results_served_when_configured() {
    let server = TestServer::start().await;
    server.add_result("foo.jpg", b"not really a jpeg");

    let response = server
        .client()
        .get(server.url("/results/foo.jpg"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
    assert_eq!(&response.bytes().await.unwrap()[..], b"not really a jpeg");
}

#[tokio::test]
async fn test_results_missing_file() {
    let server = TestServer::start().await;

    let response = server
        .client()
        .get(server.url("/results/absent.csv"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_results_not_mounted_without_results_dir() {
    let server = TestServer::start_without_results().await;

    let response = server
        .client()
        .get(server.url("/results/foo.jpg"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_unknown_route() {
    let server = TestServer::start().await;

    let response = server
        .client()
        .get(server.url("/api/unknown"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_list_videos() {
    let server = TestServer::start().await;
    server.add_video("b.mp4", b"b");
    server.add_video("a.mov", b"a");
    server.add_video("readme.txt", b"ignored");

    let response = server
        .client()
        .get(server.url("/api/videos"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json, serde_json::json!(["a.mov", "b.mp4"]));
}

#[tokio::test]
async fn test_thumbnail() {
    let server = TestServer::start().await;
    server.add_video("cat.mp4", b"\xFF\xD8\xFFframe");

    let response = server
        .client()
        .get(server.url("/thumbnail/cat.mp4"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
    assert_eq!(&response.bytes().await.unwrap()[..], b"\xFF\xD8\xFFframe");
}

#[tokio::test]
async fn test_thumbnail_rejects_traversal() {
    let server = TestServer::start().await;

    // %2F decodes to '/' inside the single path segment
    let response = server
        .client()
        .get(server.url("/thumbnail/..%2Fetc%2Fpasswd"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_thumbnail_unknown_video() {
    let server = TestServer::start().await;

    let response = server
        .client()
        .get(server.url("/thumbnail/missing.mp4"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[test]
fn test_incomplete_handler_set_fails_at_startup() {
    async fn ok(_: HandlerRequest) -> axum::response::Response {
        StatusCode::OK.into_response()
    }

    let result = HandlerSet::builder()
        .get_videos(ok)
        .get_thumbnail(ok)
        .get_status(ok)
        .build();

    let err = result.unwrap_err();
    assert!(err.to_string().contains("postVideo"));
}
