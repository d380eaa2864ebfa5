//! Role Handlers
//!
//! Reads require `roles.view` (route layer); writes require `roles.manage`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::request::{
    CreateRoleRequest, SetPermissionsRequest, UpdateRoleRequest,
};
use crate::application::dto::response::{
    PermissionGroupResponse, RoleDetailResponse, RoleResponse,
};
use crate::domain::permissions;
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<RoleResponse>>, AppError> {
    Ok(Json(state.roles.list().await?))
}

pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleDetailResponse>, AppError> {
    Ok(Json(state.roles.get(id).await?))
}

pub async fn create_role(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleDetailResponse>), AppError> {
    auth.require(permissions::ROLES_MANAGE)?;
    let role = state.roles.create(&auth.actor(), body).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateRoleRequest>,
) -> Result<Json<RoleDetailResponse>, AppError> {
    auth.require(permissions::ROLES_MANAGE)?;
    Ok(Json(state.roles.update(&auth.actor(), id, body).await?))
}

pub async fn delete_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require(permissions::ROLES_MANAGE)?;
    state.roles.delete(&auth.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the permission set of a role.
pub async fn set_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SetPermissionsRequest>,
) -> Result<Json<RoleDetailResponse>, AppError> {
    auth.require(permissions::ROLES_MANAGE)?;
    Ok(Json(
        state.roles.set_permissions(&auth.actor(), id, body).await?,
    ))
}

pub async fn list_permissions(State(state): State<AppState>) -> Json<Vec<PermissionGroupResponse>> {
    Json(state.roles.permission_groups())
}
