//! Current User Handlers
//!
//! The signed-in user's own profile at `/users/me`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{DeleteAccountRequest, UpdateProfileRequest};
use crate::application::dto::response::{AuditEventsResponse, UserResponse};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::pagination::PaginationQuery;
use crate::startup::AppState;

pub async fn get_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(state.profile.me(auth.user_id).await?))
}

pub async fn update_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(state.profile.update_profile(auth.user_id, body).await?))
}

pub async fn delete_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<DeleteAccountRequest>,
) -> Result<StatusCode, AppError> {
    state.profile.delete_account(auth.user_id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_my_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<AuditEventsResponse>, AppError> {
    Ok(Json(
        state.profile.my_audit(auth.user_id, page.normalized()).await?,
    ))
}
