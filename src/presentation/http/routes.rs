//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::compression::CompressionLayer;

use super::handlers;
use crate::domain::permissions;
use crate::presentation::middleware::{
    auth_middleware, create_cors_layer, create_security_headers_layer, create_trace_layer,
    rate_limit_api, rate_limit_auth, require_permission, track_metrics, validate_origin,
};
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let settings = state.settings.clone();

    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        .route("/metrics", get(handlers::health::metrics_handler))
        .layer(middleware::from_fn(track_metrics))
        .layer(middleware::from_fn_with_state(state.clone(), validate_origin))
        .layer(CompressionLayer::new())
        .layer(create_cors_layer(&settings.cors))
        .layer(create_trace_layer())
        // Outermost, so every response carries the headers
        .layer(create_security_headers_layer(&settings))
        .with_state(state)
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .merge(protected_routes(state))
}

/// Authentication routes, rate limited per client address
fn auth_routes(state: AppState) -> Router<AppState> {
    let signed_in = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route(
            "/resend-verification",
            post(handlers::auth::resend_verification),
        )
        .route("/change-password", post(handlers::auth::change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh_token))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password", post(handlers::auth::reset_password))
        .route("/verify-email", post(handlers::auth::verify_email))
        .merge(signed_in)
        .route_layer(middleware::from_fn_with_state(state, rate_limit_auth))
}

/// Routes requiring a valid access token. Rate limiting runs inside
/// authentication so limits are counted per user.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/contacts", contact_routes())
        .nest("/notes", note_routes())
        .nest("/admin", admin_routes())
        .nest("/demo", demo_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_api))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(handlers::users::get_current_user)
                .patch(handlers::users::update_current_user)
                .delete(handlers::users::delete_current_user),
        )
        .route("/me/audit", get(handlers::users::get_my_audit))
}

fn contact_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::contacts::list_contacts)
                .post(handlers::contacts::create_contact)
                .delete(handlers::contacts::delete_all_contacts),
        )
        .route("/stats", get(handlers::contacts::contact_stats))
        .route("/bulk-delete", post(handlers::contacts::bulk_delete_contacts))
        .route("/seed", post(handlers::contacts::seed_contacts))
        .route(
            "/{id}",
            get(handlers::contacts::get_contact)
                .put(handlers::contacts::update_contact)
                .delete(handlers::contacts::delete_contact),
        )
        .route("/{id}/favorite", post(handlers::contacts::toggle_favorite))
        .route("/{id}/audit", get(handlers::contacts::contact_audit))
}

fn note_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        .route("/stats", get(handlers::notes::note_stats))
        .route(
            "/{id}",
            get(handlers::notes::get_note)
                .put(handlers::notes::update_note)
                .delete(handlers::notes::delete_note),
        )
}

/// Administration. Each group requires its `*.view` permission; handlers
/// check the stronger permission for writes.
fn admin_routes() -> Router<AppState> {
    let users = Router::new()
        .route(
            "/",
            get(handlers::admin::list_users).post(handlers::admin::create_user),
        )
        .route(
            "/{id}",
            get(handlers::admin::get_user).delete(handlers::admin::delete_user),
        )
        .route("/{id}/lock", post(handlers::admin::lock_user))
        .route("/{id}/unlock", post(handlers::admin::unlock_user))
        .route("/{id}/verify-email", post(handlers::admin::verify_email))
        .route(
            "/{id}/send-password-reset",
            post(handlers::admin::send_password_reset),
        )
        .route("/{id}/roles", post(handlers::admin::assign_role))
        .route("/{id}/roles/{role}", delete(handlers::admin::remove_role))
        .route("/{id}/audit", get(handlers::admin::user_audit))
        .route_layer(middleware::from_fn_with_state(
            permissions::USERS_VIEW,
            require_permission,
        ));

    let roles = Router::new()
        .route(
            "/roles",
            get(handlers::roles::list_roles).post(handlers::roles::create_role),
        )
        .route(
            "/roles/{id}",
            get(handlers::roles::get_role)
                .put(handlers::roles::update_role)
                .delete(handlers::roles::delete_role),
        )
        .route(
            "/roles/{id}/permissions",
            put(handlers::roles::set_permissions),
        )
        .route("/permissions", get(handlers::roles::list_permissions))
        .route_layer(middleware::from_fn_with_state(
            permissions::ROLES_VIEW,
            require_permission,
        ));

    let jobs = Router::new()
        .route("/", get(handlers::jobs::list_jobs))
        .route("/restore", post(handlers::jobs::restore_jobs))
        .route("/{id}", get(handlers::jobs::get_job))
        .route("/{id}/trigger", post(handlers::jobs::trigger_job))
        .route("/{id}/pause", post(handlers::jobs::pause_job))
        .route("/{id}/resume", post(handlers::jobs::resume_job))
        .route_layer(middleware::from_fn_with_state(
            permissions::JOBS_VIEW,
            require_permission,
        ));

    Router::new()
        .nest("/users", users)
        .nest("/jobs", jobs)
        .merge(roles)
}

fn demo_routes() -> Router<AppState> {
    Router::new().route("/switch-role", post(handlers::demo::switch_role))
}
