//! Recurring Job Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::response::{RecurringJobDetailOutput, RecurringJobOutput};
use crate::domain::permissions;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

pub async fn list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecurringJobOutput>>, AppError> {
    Ok(Json(state.jobs.list().await?))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecurringJobDetailOutput>, AppError> {
    Ok(Json(state.jobs.get(&id).await?))
}

/// Start a run now. Answers 202; the run completes in the background.
pub async fn trigger_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    auth.require(permissions::JOBS_MANAGE)?;
    state.jobs.trigger(&id).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn pause_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    auth.require(permissions::JOBS_MANAGE)?;
    state.jobs.pause(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn resume_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    auth.require(permissions::JOBS_MANAGE)?;
    state.jobs.resume(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<StatusCode, AppError> {
    auth.require(permissions::JOBS_MANAGE)?;
    state.jobs.restore().await?;
    Ok(StatusCode::NO_CONTENT)
}
