//! Contact Handlers
//!
//! All contact routes are scoped to the signed-in user; another user's
//! contact answers 404.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::request::{
    BulkDeleteRequest, ContactListParams, ContactRequest, SeedContactsRequest,
};
use crate::application::dto::response::{
    AuditEventsResponse, ContactResponse, ContactStatsResponse, CountResponse,
};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::pagination::{PaginatedResponse, PaginationQuery};
use crate::startup::AppState;

/// `GET /contacts?page_number=&page_size=&search=&sort_by=`
pub async fn list_contacts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ContactListParams>,
) -> Result<Json<PaginatedResponse<ContactResponse>>, AppError> {
    Ok(Json(state.contacts.list(auth.user_id, params).await?))
}

pub async fn get_contact(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactResponse>, AppError> {
    Ok(Json(state.contacts.get(auth.user_id, id).await?))
}

pub async fn create_contact(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<ContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    let contact = state.contacts.create(auth.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn update_contact(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<ContactRequest>,
) -> Result<Json<ContactResponse>, AppError> {
    Ok(Json(state.contacts.update(auth.user_id, id, body).await?))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.contacts.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn contact_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ContactStatsResponse>, AppError> {
    Ok(Json(state.contacts.stats(auth.user_id).await?))
}

pub async fn bulk_delete_contacts(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<BulkDeleteRequest>,
) -> Result<Json<CountResponse>, AppError> {
    let count = state.contacts.bulk_delete(auth.user_id, body.ids).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn delete_all_contacts(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<CountResponse>, AppError> {
    let count = state.contacts.delete_all(auth.user_id).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactResponse>, AppError> {
    Ok(Json(state.contacts.toggle_favorite(auth.user_id, id).await?))
}

/// Insert `count` generated contacts for trying the UI.
pub async fn seed_contacts(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<SeedContactsRequest>,
) -> Result<(StatusCode, Json<CountResponse>), AppError> {
    let count = state.contacts.seed(auth.user_id, body.count).await?;
    Ok((StatusCode::CREATED, Json(CountResponse { count })))
}

pub async fn contact_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<AuditEventsResponse>, AppError> {
    Ok(Json(
        state
            .contacts
            .audit(auth.user_id, id, page.normalized())
            .await?,
    ))
}
