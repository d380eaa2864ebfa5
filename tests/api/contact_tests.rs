//! Contact and Note API Tests
//!
//! Body validation happens before any storage access.

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

use crate::common::{body_json, request, TestApp};

#[tokio::test]
async fn test_contacts_require_authentication() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/contacts").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test_case(json!({ "name": "" }), "name" ; "empty name")]
#[test_case(json!({ "name": "Ada", "email": "nope" }), "email" ; "bad email")]
#[test_case(json!({ "name": "Ada", "status": "Won" }), "status" ; "unknown status")]
#[test_case(json!({ "name": "Ada", "source": "Billboard" }), "source" ; "unknown source")]
#[test_case(json!({ "name": "Ada", "value": -1 }), "value" ; "negative value")]
#[tokio::test]
async fn test_create_contact_rejects_invalid_body(body: serde_json::Value, field: &str) {
    let app = TestApp::new().await;
    let token = app.token(&[]).await;

    let response = app.post_json_auth("/api/v1/contacts", body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"][0]["field"], field);
}

#[tokio::test]
async fn test_bulk_delete_requires_ids() {
    let app = TestApp::new().await;
    let token = app.token(&[]).await;

    let response = app
        .post_json_auth("/api/v1/contacts/bulk-delete", json!({ "ids": [] }), &token)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test_case(0 ; "zero")]
#[test_case(101 ; "above limit")]
#[tokio::test]
async fn test_seed_count_bounds(count: i32) {
    let app = TestApp::new().await;
    let token = app.token(&[]).await;

    let response = app
        .post_json_auth("/api/v1/contacts/seed", json!({ "count": count }), &token)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"][0]["message"], "Count must be between 1 and 100.");
}

#[tokio::test]
async fn test_contact_id_must_be_uuid() {
    let app = TestApp::new().await;
    let token = app.token(&[]).await;

    let response = app.get_auth("/api/v1/contacts/not-a-uuid", &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_note_requires_title_and_content() {
    let app = TestApp::new().await;
    let token = app.token(&[]).await;

    let response = app
        .send(request(
            Method::POST,
            "/api/v1/notes",
            Some(&token),
            Some(json!({ "title": "", "content": "" })),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_note_rejects_unknown_category() {
    let app = TestApp::new().await;
    let token = app.token(&[]).await;

    let response = app
        .post_json_auth(
            "/api/v1/notes",
            json!({ "title": "Plan", "content": "Q3", "category": "Shopping" }),
            &token,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"][0]["field"], "category");
}
