//! # Netrock
//!
//! Backend for a multi-tenant CRM:
//! - Contacts with a sales pipeline, notes, and per-user statistics
//! - Append-only audit log
//! - Authentication with rotating refresh tokens and opaque email tokens
//! - Admin user and role management with string permissions
//! - Recurring maintenance jobs
//!
//! ## Architecture
//!
//! - **Domain Layer**: Entities, enums and repository traits
//! - **Application Layer**: Business services and DTOs
//! - **Infrastructure Layer**: PostgreSQL, Redis, email, captcha and jobs
//! - **Presentation Layer**: HTTP handlers and middleware
//!
//! ## Module Structure
//!
//! ```text
//! netrock/
//! +-- config/         Configuration management
//! +-- domain/         Entities, permissions, repository traits
//! +-- application/    Services and DTOs
//! +-- infrastructure/ Database, cache, email, captcha, jobs, metrics
//! +-- presentation/   HTTP routes, handlers and middleware
//! +-- shared/         Errors, pagination, validation, hashing
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
