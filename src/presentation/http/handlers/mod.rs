//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod admin;
pub mod auth;
pub mod contacts;
pub mod demo;
pub mod health;
pub mod jobs;
pub mod notes;
pub mod roles;
pub mod users;
