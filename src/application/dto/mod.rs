//! Data Transfer Objects
//!
//! Request bodies are validated with `validator` before they reach a
//! service. Responses serialize as snake_case JSON.

pub mod request;
pub mod response;
