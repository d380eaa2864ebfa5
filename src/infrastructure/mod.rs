//! Infrastructure Layer
//!
//! Implementations for external services:
//! - Database repositories (PostgreSQL)
//! - Cache (Redis, in-memory)
//! - Email delivery (Resend) and CAPTCHA verification (Turnstile)
//! - Recurring jobs and Prometheus metrics

pub mod cache;
pub mod captcha;
pub mod database;
pub mod email;
pub mod jobs;
pub mod metrics;
pub mod repositories;
