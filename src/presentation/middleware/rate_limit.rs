//! Rate Limiting Middleware
//!
//! Sliding window rate limiting over the shared cache. Limits are counted
//! per policy and per client: the authenticated user when known, otherwise
//! the peer address of the connection. Forwarded headers are not trusted.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::config::RateLimitPolicy;
use crate::infrastructure::cache::{keys, WindowHit};
use crate::infrastructure::metrics;
use crate::presentation::middleware::auth::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Named rate limit policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointType {
    /// Authentication endpoints (login, register, password reset)
    Auth,
    /// Standard API endpoints
    Api,
}

impl EndpointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointType::Auth => "auth",
            EndpointType::Api => "api",
        }
    }

    fn policy<'a>(&self, state: &'a AppState) -> &'a RateLimitPolicy {
        match self {
            EndpointType::Auth => &state.settings.rate_limit.auth,
            EndpointType::Api => &state.settings.rate_limit.api,
        }
    }
}

/// Requests admitted per window, burst included.
pub fn max_requests(policy: &RateLimitPolicy) -> u32 {
    policy.requests_per_window.saturating_add(policy.burst_allowance)
}

/// Client identifier used in the rate limit key.
fn extract_identifier(request: &Request) -> String {
    if let Some(auth_user) = request.extensions().get::<AuthUser>() {
        return format!("user:{}", auth_user.user_id);
    }

    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    match client_ip {
        Some(ip) => format!("ip:{}", ip),
        None => {
            warn!("Could not determine client identifier for rate limiting");
            "ip:unknown".to_string()
        }
    }
}

/// Rate limiting middleware for authentication endpoints.
pub async fn rate_limit_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    rate_limit_inner(state, request, next, EndpointType::Auth).await
}

/// Rate limiting middleware for standard API endpoints.
pub async fn rate_limit_api(State(state): State<AppState>, request: Request, next: Next) -> Response {
    rate_limit_inner(state, request, next, EndpointType::Api).await
}

async fn rate_limit_inner(
    state: AppState,
    request: Request,
    next: Next,
    endpoint_type: EndpointType,
) -> Response {
    if !state.settings.rate_limit.enabled {
        return next.run(request).await;
    }

    let identifier = extract_identifier(&request);
    let policy = endpoint_type.policy(&state);
    let limit = max_requests(policy);
    let key = keys::rate_limit(endpoint_type.as_str(), &identifier);

    let hit = match state
        .cache
        .sliding_window_hit(&key, limit, policy.window_seconds)
        .await
    {
        Ok(hit) => hit,
        Err(e) => {
            // Fail open
            warn!(error = %e, policy = endpoint_type.as_str(), "Rate limit check failed");
            return next.run(request).await;
        }
    };

    if hit.allowed {
        let mut response = next.run(request).await;
        add_rate_limit_headers(response.headers_mut(), limit, &hit);
        response
    } else {
        warn!(
            identifier = %identifier,
            policy = endpoint_type.as_str(),
            "Rate limit exceeded"
        );
        metrics::record_rate_limited(endpoint_type.as_str());
        create_rate_limit_response(limit, &hit)
    }
}

fn retry_after_secs(hit: &WindowHit) -> i64 {
    ((hit.retry_after_ms.max(0) + 999) / 1000).max(1)
}

fn add_rate_limit_headers(headers: &mut HeaderMap, limit: u32, hit: &WindowHit) {
    let remaining = limit.saturating_sub(hit.count);
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
}

fn create_rate_limit_response(limit: u32, hit: &WindowHit) -> Response {
    let mut response = AppError::RateLimited.into_response();
    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs(hit)));
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
    response
}
