//! Demo Handlers

use axum::{extract::State, http::StatusCode};

use crate::application::dto::request::SwitchRoleRequest;
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Switch the caller to a single system role. The current access token is
/// revoked; the client refreshes to receive the new claims.
pub async fn switch_role(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<SwitchRoleRequest>,
) -> Result<StatusCode, AppError> {
    state.demo.switch_role(auth.user_id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}
