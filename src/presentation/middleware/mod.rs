//! Middleware
//!
//! Tower middleware for request processing.

pub mod auth;
pub mod cors;
pub mod logging;
pub mod metrics;
pub mod origin;
pub mod rate_limit;
pub mod security;

pub use auth::{auth_middleware, require_permission, AuthUser};
pub use cors::create_cors_layer;
pub use logging::create_trace_layer;
pub use metrics::track_metrics;
pub use origin::validate_origin;
pub use rate_limit::{rate_limit_api, rate_limit_auth, EndpointType};
pub use security::{create_security_headers_layer, SecurityHeadersConfig, SecurityHeadersLayer};
