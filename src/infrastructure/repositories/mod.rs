//! Repository Implementations
//!
//! PostgreSQL implementations of the domain repository traits. Each
//! repository owns a clone of the pool and handles one aggregate.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::repositories::{PgContactRepository, PgUserRepository};
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let users = PgUserRepository::new(pool.clone());
//!     let contacts = PgContactRepository::new(pool);
//! }
//! ```

pub mod audit_event_repository;
pub mod contact_repository;
pub mod email_token_repository;
pub mod note_repository;
pub mod refresh_token_repository;
pub mod role_repository;
pub mod user_repository;

pub use audit_event_repository::PgAuditEventRepository;
pub use contact_repository::PgContactRepository;
pub use email_token_repository::PgEmailTokenRepository;
pub use note_repository::PgNoteRepository;
pub use refresh_token_repository::PgRefreshTokenRepository;
pub use role_repository::PgRoleRepository;
pub use user_repository::PgUserRepository;
