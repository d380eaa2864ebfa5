//! Health Check API Tests

use axum::http::{header, StatusCode};
use axum_test::TestServer;
use serde_json::Value;

use crate::common::TestApp;

async fn server() -> TestServer {
    TestServer::new(TestApp::new().await.router).unwrap()
}

#[tokio::test]
async fn test_health_check_reports_version_and_uptime() {
    let server = server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_liveness_probe() {
    let server = server().await;

    let response = server.get("/health/live").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "alive");
}

#[tokio::test]
async fn test_readiness_fails_without_database() {
    let server = server().await;

    let response = server.get("/health/ready").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = response.json();
    assert_eq!(json["status"], "unhealthy");
    assert_eq!(json["checks"]["database"]["status"], "unhealthy");
    assert_eq!(json["checks"]["redis"]["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_exposes_http_counters() {
    let server = server().await;

    server.get("/health/live").await.assert_status_ok();
    let response = server.get("/metrics").await;

    response.assert_status_ok();
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
    let body = response.text();
    assert!(body.contains("netrock_http_requests_total"));
    assert!(body.contains("path=\"/health/live\""));
}
