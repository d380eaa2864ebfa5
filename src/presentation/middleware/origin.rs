//! Origin Validation
//!
//! Rejects state-changing requests whose `Origin` header names a site that
//! is not allowed to call the API. CORS alone only stops the browser from
//! reading the response; this stops the write from happening.

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::config::CorsSettings;
use crate::shared::error::ErrorResponse;
use crate::startup::AppState;

fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Whether a request with this method and origin may proceed.
pub fn origin_allowed(settings: &CorsSettings, method: &Method, origin: Option<&str>) -> bool {
    if !is_state_changing(method) || settings.allow_all {
        return true;
    }

    match origin {
        None => true,
        Some(origin) => settings
            .allowed_origins
            .iter()
            .any(|allowed| allowed.trim_end_matches('/').eq_ignore_ascii_case(origin)),
    }
}

pub async fn validate_origin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .map(|v| v.to_str().unwrap_or_default().to_string());

    if origin_allowed(&state.settings.cors, request.method(), origin.as_deref()) {
        return next.run(request).await;
    }

    warn!(
        origin = origin.as_deref().unwrap_or_default(),
        method = %request.method(),
        path = %request.uri().path(),
        "Cross-origin request blocked"
    );
    ErrorResponse::new(StatusCode::FORBIDDEN, "Cross-origin request blocked.").into_response()
}
