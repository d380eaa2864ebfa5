//! Authentication Middleware
//!
//! Bearer JWT validation for protected routes. Besides signature, expiry,
//! issuer and audience, the token's `security_stamp` claim must match the
//! user's current stamp; rotating the stamp revokes every outstanding
//! access token.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::services::Actor;
use crate::infrastructure::cache::{keys, CacheExt};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user extension
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Fail with 403 unless the user holds `permission`.
    pub fn require(&self, permission: &str) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Missing permission '{}'.",
                permission
            )))
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.roles.clone())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))
    }
}

fn bearer_token(request: &Request) -> Result<Authorization<Bearer>, AppError> {
    if !request.headers().contains_key(axum::http::header::AUTHORIZATION) {
        return Err(AppError::Unauthorized("Missing authorization header".into()));
    }
    request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))
}

/// Current stamp of a user, read through the cache.
async fn current_stamp(state: &AppState, user_id: Uuid) -> Result<Option<String>, AppError> {
    let key = keys::security_stamp(user_id);
    match state.cache.get::<String>(&key).await {
        Ok(Some(stamp)) => return Ok(Some(stamp)),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Security stamp cache read failed"),
    }

    let stamp = state.users.get_security_stamp(user_id).await?;
    if let Some(stamp) = &stamp {
        if let Err(e) = state
            .cache
            .set_ex(&key, stamp, keys::SECURITY_STAMP_TTL_SECS)
            .await
        {
            warn!(error = %e, "Security stamp cache write failed");
        }
    }
    Ok(stamp)
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = bearer_token(&request)?;
    let claims = state.tokens.validate(bearer.token())?;
    let user_id = claims.user_id()?;

    match current_stamp(&state, user_id).await? {
        Some(stamp) if stamp == claims.security_stamp => {}
        Some(_) => {
            debug!(user_id = %user_id, "Access token presented with a stale security stamp");
            return Err(AppError::Unauthorized("Token has been revoked".into()));
        }
        None => return Err(AppError::Unauthorized("Invalid token".into())),
    }

    request.extensions_mut().insert(AuthUser {
        user_id,
        roles: claims.roles,
        permissions: claims.permissions,
    });

    Ok(next.run(request).await)
}

/// Route-level permission guard. Must run inside [`auth_middleware`].
///
/// ```rust,ignore
/// .route_layer(middleware::from_fn_with_state(permissions::USERS_VIEW, require_permission))
/// ```
pub async fn require_permission(
    State(permission): State<&'static str>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    if let Err(e) = user.require(permission) {
        debug!(user_id = %user.user_id, permission, "Permission denied");
        return Err(e);
    }

    Ok(next.run(request).await)
}
