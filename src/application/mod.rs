//! Application Layer
//!
//! Services that carry the CRM and account use cases, and the DTOs they
//! exchange with the presentation layer.

pub mod dto;
pub mod services;
