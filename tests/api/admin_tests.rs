//! Admin API Tests
//!
//! Permission guards and the job management endpoints, which live entirely
//! in process.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_test::assert_ok;

use netrock::infrastructure::jobs::RecurringJob;
use netrock::shared::error::AppError;

use crate::common::{body_json, request, TestApp};

struct NoopJob;

#[async_trait]
impl RecurringJob for NoopJob {
    fn id(&self) -> &'static str {
        "noop-cleanup"
    }

    fn cron(&self) -> &'static str {
        "0 * * * *"
    }

    async fn execute(&self) -> Result<(), AppError> {
        Ok(())
    }
}

async fn app_with_job() -> TestApp {
    let app = TestApp::new().await;
    assert_ok!(app.scheduler.register(Arc::new(NoopJob)));
    app
}

#[tokio::test]
async fn test_admin_users_requires_users_view() {
    let app = TestApp::new().await;
    let token = app.token(&["contacts.view"]).await;

    let response = app.get_auth("/api/v1/admin/users", &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["detail"], "Missing permission 'users.view'.");
}

#[tokio::test]
async fn test_roles_require_roles_view() {
    let app = TestApp::new().await;
    let token = app.token(&["users.view"]).await;

    let response = app.get_auth("/api/v1/admin/roles", &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_user_requires_users_manage() {
    let app = TestApp::new().await;
    let token = app.token(&["users.view"]).await;

    let response = app
        .post_json_auth(
            "/api/v1/admin/users",
            json!({ "email": "invitee@example.com" }),
            &token,
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_permission_groups_listed() {
    let app = TestApp::new().await;
    let token = app.token(&["roles.view"]).await;

    let response = app.get_auth("/api/v1/admin/permissions", &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let groups = json.as_array().unwrap();
    assert_eq!(groups.len(), 3);
    assert!(groups
        .iter()
        .flat_map(|g| g["permissions"].as_array().unwrap())
        .any(|p| p == "jobs.manage"));
}

#[tokio::test]
async fn test_list_jobs() {
    let app = app_with_job().await;
    let token = app.token(&["jobs.view"]).await;

    let response = app.get_auth("/api/v1/admin/jobs", &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json[0]["id"], "noop-cleanup");
    assert_eq!(json[0]["is_paused"], false);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let app = app_with_job().await;
    let token = app.token(&["jobs.view"]).await;

    let response = app.get_auth("/api/v1/admin/jobs/missing", &token).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["detail"], "Job 'missing' not found.");
}

#[tokio::test]
async fn test_pause_requires_jobs_manage() {
    let app = app_with_job().await;
    let token = app.token(&["jobs.view"]).await;

    let response = app
        .send(request(
            Method::POST,
            "/api/v1/admin/jobs/noop-cleanup/pause",
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_pause_and_restore_jobs() {
    let app = app_with_job().await;
    let token = app.token(&["jobs.view", "jobs.manage"]).await;

    let response = app
        .send(request(
            Method::POST,
            "/api/v1/admin/jobs/noop-cleanup/pause",
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let detail = body_json(
        app.get_auth("/api/v1/admin/jobs/noop-cleanup", &token)
            .await,
    )
    .await;
    assert_eq!(detail["is_paused"], true);

    let response = app
        .send(request(
            Method::POST,
            "/api/v1/admin/jobs/restore",
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let jobs = body_json(app.get_auth("/api/v1/admin/jobs", &token).await).await;
    assert_eq!(jobs[0]["is_paused"], false);
}

#[tokio::test]
async fn test_trigger_job_is_accepted() {
    let app = app_with_job().await;
    let token = app.token(&["jobs.view", "jobs.manage"]).await;

    let response = app
        .send(request(
            Method::POST,
            "/api/v1/admin/jobs/noop-cleanup/trigger",
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}
