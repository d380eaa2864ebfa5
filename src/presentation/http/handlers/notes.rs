//! Note Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::request::NoteRequest;
use crate::application::dto::response::{NoteResponse, NoteStatsResponse};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

pub async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<NoteResponse>>, AppError> {
    Ok(Json(state.notes.list(auth.user_id).await?))
}

pub async fn get_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteResponse>, AppError> {
    Ok(Json(state.notes.get(auth.user_id, id).await?))
}

pub async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<NoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), AppError> {
    let note = state.notes.create(auth.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<NoteRequest>,
) -> Result<Json<NoteResponse>, AppError> {
    Ok(Json(state.notes.update(auth.user_id, id, body).await?))
}

pub async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.notes.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn note_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<NoteStatsResponse>, AppError> {
    Ok(Json(state.notes.stats(auth.user_id).await?))
}
