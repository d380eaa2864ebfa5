//! # Domain Value Objects
//!
//! - **Permissions**: permission strings, groups and system roles

mod access;

pub use access::*;
