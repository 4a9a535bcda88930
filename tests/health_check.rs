mod common;

use axum_test::TestServer;
use std::sync::Arc;
use tower::ServiceExt;
use voicepaint::configuration::MAX_UPLOAD_BYTES;
use voicepaint::server::services::StandInGateway;

#[tokio::test]
async fn health_check_works() {
    // Arrange
    let app = common::router(Arc::new(StandInGateway::instant()), MAX_UPLOAD_BYTES);
    let server = TestServer::new(app.into_make_service()).unwrap();

    // Act
    let response = server.get("/health").await;

    // Assert
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Server is running");
}

#[tokio::test]
async fn cors_allows_the_configured_frontend() {
    let app = common::router(Arc::new(StandInGateway::instant()), MAX_UPLOAD_BYTES);

    let request = axum::http::Request::builder()
        .method("OPTIONS")
        .uri("/api/audio-to-image")
        .header("origin", common::FRONTEND)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(
        headers["access-control-allow-origin"],
        common::FRONTEND
    );
    assert_eq!(headers["access-control-allow-credentials"], "true");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn cors_ignores_other_origins() {
    let app = common::router(Arc::new(StandInGateway::instant()), MAX_UPLOAD_BYTES);

    let request = axum::http::Request::builder()
        .uri("/health")
        .header("origin", "https://elsewhere.example")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}
