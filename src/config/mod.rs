//! # Configuration Module
//!
//! Layered configuration loading:
//! - Built-in defaults
//! - Configuration files (config/default.toml, config/{RUN_ENV}.toml)
//! - Environment variables (prefixed with APP__)
//! - Well-known variables such as `DATABASE_URL` and `JWT_SECRET`
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use netrock::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Server will listen on {}", settings.server_addr());
//! ```

mod settings;

pub use settings::*;

#[cfg(test)]
pub(crate) use settings::tests::test_settings;
