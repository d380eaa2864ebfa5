//! Cross-cutting middleware: origin validation, security headers, CORS and
//! rate limiting.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{body_json, request, test_settings, TestApp, ALLOWED_ORIGIN};

#[tokio::test]
async fn test_foreign_origin_blocked_on_writes() {
    let app = TestApp::new().await;
    let mut req = request(
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": "a@example.com", "password": "secret" })),
    );
    req.headers_mut()
        .insert(header::ORIGIN, "https://evil.example.com".parse().unwrap());

    let response = app.send(req).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/problem+json"
    );
    let json = body_json(response).await;
    assert_eq!(json["status"], 403);
    assert_eq!(json["detail"], "Cross-origin request blocked.");
}

#[tokio::test]
async fn test_allowed_origin_passes() {
    let app = TestApp::new().await;
    let mut req = request(
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "secret1" })),
    );
    req.headers_mut()
        .insert(header::ORIGIN, ALLOWED_ORIGIN.to_uppercase().parse().unwrap());

    let response = app.send(req).await;

    // Reaches body validation
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_foreign_origin_may_read() {
    let app = TestApp::new().await;
    let mut req = request(Method::GET, "/health/live", None, None);
    req.headers_mut()
        .insert(header::ORIGIN, "https://evil.example.com".parse().unwrap());

    let response = app.send(req).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = TestApp::new().await;

    for response in [
        app.get("/health/live").await,
        app.get("/api/v1/contacts").await,
    ] {
        let headers = response.headers();
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
    }
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let app = TestApp::new().await;
    let mut req = request(Method::OPTIONS, "/api/v1/contacts", None, None);
    let headers = req.headers_mut();
    headers.insert(header::ORIGIN, ALLOWED_ORIGIN.parse().unwrap());
    headers.insert(header::ACCESS_CONTROL_REQUEST_METHOD, "POST".parse().unwrap());

    let response = app.send(req).await;

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ALLOWED_ORIGIN
    );
}

#[tokio::test]
async fn test_auth_rate_limit_rejects_after_window_is_full() {
    let mut settings = test_settings();
    settings.rate_limit.enabled = true;
    settings.rate_limit.auth.requests_per_window = 2;
    settings.rate_limit.auth.burst_allowance = 0;
    let app = TestApp::with_settings(settings).await;
    let invalid = json!({ "username": "", "password": "" });

    for _ in 0..2 {
        let response = app.post_json("/api/v1/auth/login", invalid.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().contains_key("X-RateLimit-Remaining"));
    }

    let response = app.post_json("/api/v1/auth/login", invalid).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let json = body_json(response).await;
    assert_eq!(json["status"], 429);
}

#[tokio::test]
async fn test_auth_rate_limit_is_counted_per_peer() {
    let mut settings = test_settings();
    settings.rate_limit.enabled = true;
    settings.rate_limit.auth.requests_per_window = 1;
    settings.rate_limit.auth.burst_allowance = 0;
    let app = TestApp::with_settings(settings).await;
    let invalid = json!({ "username": "", "password": "" });
    let login = |peer: &str| {
        let mut req = request(Method::POST, "/api/v1/auth/login", None, Some(invalid.clone()));
        req.extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        req
    };

    let response = app.send(login("10.0.0.1:4000")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = app.send(login("10.0.0.1:4001")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app.send(login("10.0.0.2:4000")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_limit_disabled_passes_everything() {
    let app = TestApp::new().await;
    let invalid = json!({ "username": "", "password": "" });

    for _ in 0..15 {
        let response = app.post_json("/api/v1/auth/login", invalid.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
