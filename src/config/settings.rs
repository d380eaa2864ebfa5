//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Redis configuration
    pub redis: RedisSettings,

    /// Token, password and lockout settings
    pub auth: AuthSettings,

    /// Rate limiting configuration
    pub rate_limit: RateLimitSettings,

    /// CORS and origin validation configuration
    pub cors: CorsSettings,

    /// Outbound email configuration
    pub email: EmailSettings,

    /// Captcha verification configuration
    pub captcha: CaptchaSettings,

    /// Recurring job configuration
    pub jobs: JobsSettings,

    /// Demo mode configuration
    pub demo: DemoSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    pub url: String,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt: JwtSettings,
    pub email_token: EmailTokenSettings,
    pub lockout: LockoutSettings,
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens
    pub secret: String,

    /// Token issuer (`iss` claim)
    pub issuer: String,

    /// Token audience (`aud` claim)
    pub audience: String,

    /// Access token lifetime in minutes
    pub expires_in_minutes: i64,

    /// Refresh token lifetime in days
    pub refresh_token_expires_in_days: i64,
}

/// Opaque email token configuration (password reset, email verification).
#[derive(Debug, Clone, Deserialize)]
pub struct EmailTokenSettings {
    /// Number of random bytes in a raw token
    pub token_length_in_bytes: usize,

    /// Token lifetime in hours
    pub lifetime_hours: i64,
}

/// Account lockout after repeated failed logins.
#[derive(Debug, Clone, Deserialize)]
pub struct LockoutSettings {
    pub max_failed_attempts: i32,
    pub duration_minutes: i64,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Disable to skip rate limiting entirely
    pub enabled: bool,

    /// Policy for authentication endpoints
    pub auth: RateLimitPolicy,

    /// Policy for all other API endpoints
    pub api: RateLimitPolicy,
}

/// A sliding window rate limit policy.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitPolicy {
    /// Requests allowed per window
    pub requests_per_window: u32,

    /// Window duration in seconds
    pub window_seconds: u64,

    /// Extra requests tolerated above the base limit
    pub burst_allowance: u32,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Origins allowed to call the API with credentials
    pub allowed_origins: Vec<String>,

    /// Accept any origin
    pub allow_all: bool,
}

/// Outbound email configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// Sender address
    pub from_address: String,

    /// Sender display name
    pub from_name: String,

    /// Product name rendered in email headers
    pub app_name: String,

    /// Base URL of the frontend, used to build links in emails
    pub frontend_base_url: Option<String>,

    /// Support contact shown in email footers
    pub support_email: Option<String>,

    pub resend: ResendSettings,
}

/// Resend provider settings. Emails are only logged when no key is set.
#[derive(Debug, Clone, Deserialize)]
pub struct ResendSettings {
    pub api_key: Option<String>,
    pub base_url: String,
}

/// Cloudflare Turnstile configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaSettings {
    pub secret_key: String,
    pub verify_url: String,
}

/// Recurring job configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JobsSettings {
    /// Start the scheduler on boot
    pub enabled: bool,

    /// Executions kept per job
    pub history_size: usize,
}

/// Demo mode configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoSettings {
    /// Enables role switching and PII masking in admin listings
    pub enabled: bool,
}

/// Minimum required length for JWT secret (256 bits = 32 bytes)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if any value fails [`Settings::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("auth.jwt.issuer", "netrock")?
            .set_default("auth.jwt.audience", "netrock-frontend")?
            .set_default("auth.jwt.expires_in_minutes", 10)?
            .set_default("auth.jwt.refresh_token_expires_in_days", 7)?
            .set_default("auth.email_token.token_length_in_bytes", 32)?
            .set_default("auth.email_token.lifetime_hours", 24)?
            .set_default("auth.lockout.max_failed_attempts", 5)?
            .set_default("auth.lockout.duration_minutes", 5)?
            .set_default("rate_limit.enabled", true)?
            .set_default("rate_limit.auth.requests_per_window", 10)?
            .set_default("rate_limit.auth.window_seconds", 60)?
            .set_default("rate_limit.auth.burst_allowance", 2)?
            .set_default("rate_limit.api.requests_per_window", 120)?
            .set_default("rate_limit.api.window_seconds", 60)?
            .set_default("rate_limit.api.burst_allowance", 30)?
            .set_default("cors.allowed_origins", vec!["http://localhost:5173"])?
            .set_default("cors.allow_all", false)?
            .set_default("email.from_address", "noreply@example.com")?
            .set_default("email.from_name", "Netrock")?
            .set_default("email.app_name", "Netrock")?
            .set_default("email.resend.base_url", "https://api.resend.com")?
            .set_default("captcha.secret_key", "")?
            .set_default(
                "captcha.verify_url",
                "https://challenges.cloudflare.com/turnstile/v0/siteverify",
            )?
            .set_default("jobs.enabled", true)?
            .set_default("jobs.history_size", 20)?
            .set_default("demo.enabled", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option("auth.jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option(
                "email.resend.api_key",
                std::env::var("RESEND_API_KEY").ok(),
            )?
            .set_override_option(
                "captcha.secret_key",
                std::env::var("TURNSTILE_SECRET_KEY").ok(),
            )?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    /// Check value ranges and cross-field requirements.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let jwt = &self.auth.jwt;
        if jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "JWT secret must be at least {} characters. Current length: {}",
                MIN_JWT_SECRET_LENGTH,
                jwt.secret.len()
            )));
        }
        if !(1..=120).contains(&jwt.expires_in_minutes) {
            return Err(ConfigError::Message(
                "auth.jwt.expires_in_minutes must be between 1 and 120".into(),
            ));
        }
        if !(1..=365).contains(&jwt.refresh_token_expires_in_days) {
            return Err(ConfigError::Message(
                "auth.jwt.refresh_token_expires_in_days must be between 1 and 365".into(),
            ));
        }

        let email_token = &self.auth.email_token;
        if !(16..=128).contains(&email_token.token_length_in_bytes) {
            return Err(ConfigError::Message(
                "auth.email_token.token_length_in_bytes must be between 16 and 128".into(),
            ));
        }
        if !(1..=168).contains(&email_token.lifetime_hours) {
            return Err(ConfigError::Message(
                "auth.email_token.lifetime_hours must be between 1 and 168".into(),
            ));
        }

        if let Some(key) = self.email.resend.api_key.as_deref().filter(|k| !k.is_empty()) {
            if !key.starts_with("re_") {
                return Err(ConfigError::Message(
                    "email.resend.api_key must start with 're_'".into(),
                ));
            }
            if self.email.frontend_base_url.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::Message(
                    "email.frontend_base_url is required when a Resend API key is configured"
                        .into(),
                ));
            }
        }

        Ok(())
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

impl EmailSettings {
    /// Frontend link for a path, e.g. `/reset-password?token=..`.
    pub fn frontend_url(&self, path_and_query: &str) -> String {
        let base = self
            .frontend_base_url
            .as_deref()
            .unwrap_or("http://localhost:5173")
            .trim_end_matches('/');
        format!("{}{}", base, path_and_query)
    }

    /// `"Name <address>"` sender header.
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_address)
    }
}
