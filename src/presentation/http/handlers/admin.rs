//! User Administration Handlers
//!
//! The whole group requires `users.view`; writes additionally check
//! `users.manage` or `users.assign_roles`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::request::{
    AssignRoleRequest, CreateUserRequest, LockUserRequest, UserListParams,
};
use crate::application::dto::response::{AdminUserResponse, AuditEventsResponse};
use crate::domain::permissions;
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::pagination::{PaginatedResponse, PaginationQuery};
use crate::startup::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<UserListParams>,
) -> Result<Json<PaginatedResponse<AdminUserResponse>>, AppError> {
    Ok(Json(state.admin.list_users(&auth.actor(), params).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminUserResponse>, AppError> {
    Ok(Json(state.admin.get_user(&auth.actor(), id).await?))
}

/// Create a passwordless account and email the user an invitation link.
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<AdminUserResponse>), AppError> {
    auth.require(permissions::USERS_MANAGE)?;
    let user = state.admin.create_user(&auth.actor(), body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// The body is optional; without one the lock does not expire.
pub async fn lock_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<LockUserRequest>>,
) -> Result<StatusCode, AppError> {
    auth.require(permissions::USERS_MANAGE)?;
    let req = body.map(|Json(req)| req).unwrap_or_default();
    state.admin.lock_user(&auth.actor(), id, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlock_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require(permissions::USERS_MANAGE)?;
    state.admin.unlock_user(&auth.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require(permissions::USERS_MANAGE)?;
    state.admin.delete_user(&auth.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn verify_email(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require(permissions::USERS_MANAGE)?;
    state.admin.verify_email(&auth.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn send_password_reset(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require(permissions::USERS_MANAGE)?;
    state.admin.send_password_reset(&auth.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<AssignRoleRequest>,
) -> Result<StatusCode, AppError> {
    auth.require(permissions::USERS_ASSIGN_ROLES)?;
    state.admin.assign_role(&auth.actor(), id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, role)): Path<(Uuid, String)>,
) -> Result<StatusCode, AppError> {
    auth.require(permissions::USERS_ASSIGN_ROLES)?;
    state.admin.remove_role(&auth.actor(), id, &role).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn user_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<AuditEventsResponse>, AppError> {
    Ok(Json(
        state
            .admin
            .user_audit(&auth.actor(), id, page.normalized())
            .await?,
    ))
}
