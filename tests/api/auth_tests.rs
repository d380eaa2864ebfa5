//! Authentication API Tests
//!
//! Request validation and access-token checks. Flows that persist users
//! are covered by the service unit tests.

use axum::http::{header, Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use netrock::infrastructure::cache::{keys, CacheExt};

use crate::common::{body_json, request, TestApp};

#[tokio::test]
async fn test_register_with_invalid_email_fails() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/v1/auth/register",
            json!({ "email": "not-an-email", "password": "ValidPassword123!" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"][0]["field"], "email");
}

#[tokio::test]
async fn test_register_with_short_password_fails() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/v1/auth/register",
            json!({ "email": "new@example.com", "password": "abc" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"][0]["field"], "password");
    assert_eq!(
        json["errors"][0]["message"],
        "Password must be at least 6 characters."
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new().await;
    let req = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"username\":"))
        .unwrap();

    let response = app.send(req).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/users/me").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/problem+json"
    );
}

#[tokio::test]
async fn test_logout_requires_token() {
    let app = TestApp::new().await;

    let response = app.post_json("/api/v1/auth/logout", json!({})).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let app = TestApp::new().await;

    let response = app.get_auth("/api/v1/admin/jobs", "not.a.jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_issuer_rejected() {
    let app = TestApp::new().await;
    let mut other = crate::common::test_settings();
    other.auth.jwt.issuer = "someone-else".into();
    let foreign = TestApp::with_settings(other).await;
    let token = foreign.token(&["jobs.view"]).await;

    let response = app.get_auth("/api/v1/admin/jobs", &token).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rotated_security_stamp_revokes_token() {
    let app = TestApp::new().await;
    let (user_id, token) = app.token_with(&["Admin"], &["jobs.view"]).await;

    let response = app.get_auth("/api/v1/admin/jobs", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.cache
        .set_ex(&keys::security_stamp(user_id), &"ROTATED", 300)
        .await
        .unwrap();

    let response = app.get_auth("/api/v1/admin/jobs", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password_validates_body() {
    let app = TestApp::new().await;
    let token = app.token(&[]).await;

    let response = app
        .send(request(
            Method::POST,
            "/api/v1/auth/change-password",
            Some(&token),
            Some(json!({ "current_password": "", "new_password": "abc" })),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["current_password", "new_password"]);
}

#[tokio::test]
async fn test_demo_switch_role_hidden_outside_demo_mode() {
    let app = TestApp::new().await;
    let token = app.token(&[]).await;

    let response = app
        .post_json_auth(
            "/api/v1/demo/switch-role",
            json!({ "role": "Admin" }),
            &token,
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
