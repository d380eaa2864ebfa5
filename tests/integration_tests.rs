//! Integration Tests Entry Point
//!
//! - `api/` - REST API endpoint tests
//! - `common/` - Shared test utilities

mod api;
mod common;
