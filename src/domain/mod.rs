//! # Domain Layer
//!
//! Core business types of the CRM, independent of storage and transport.
//!
//! ## Structure
//!
//! - **entities**: Contacts, notes, users, roles, tokens and audit events
//! - **value_objects**: Permissions and system roles
//!
//! Repository traits define data access contracts; the infrastructure
//! layer implements them against PostgreSQL.

pub mod entities;
pub mod value_objects;

pub use entities::*;
pub use value_objects::*;
