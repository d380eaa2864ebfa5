//! # Domain Entities
//!
//! Core domain entities. All entities map directly to their database tables.
//!
//! ## CRM Entities
//!
//! - **Contact**: A sales contact with pipeline status and value
//! - **Note**: A categorized, pinnable note
//!
//! ## Account Entities
//!
//! - **User**: Account with credentials, lockout state and security stamp
//! - **Role**: Named permission set assigned to users
//! - **RefreshToken**: Rotating refresh tokens
//! - **EmailToken**: Opaque tokens for password reset and email verification
//!
//! ## Audit
//!
//! - **AuditEvent**: Append-only record of account and contact actions
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access
//! operations, implemented in the infrastructure layer.

mod audit_event;
mod contact;
mod email_token;
mod note;
mod refresh_token;
mod role;
mod user;

pub use audit_event::{entity_types, AuditAction, AuditEvent, AuditEventRepository};
pub use contact::{
    Contact, ContactFields, ContactListQuery, ContactRepository, ContactSort, ContactSource,
    ContactStats, ContactStatus,
};
pub use email_token::{EmailToken, EmailTokenPurpose, EmailTokenRepository};
pub use note::{Note, NoteCategory, NoteRepository, NoteStats};
pub use refresh_token::{RefreshToken, RefreshTokenRepository};
pub use role::{Role, RoleRepository, RoleWithCount, MAX_ROLE_NAME_LENGTH};
pub use user::{normalize_email, User, UserRepository};

#[cfg(test)]
pub use audit_event::MockAuditEventRepository;
#[cfg(test)]
pub(crate) use contact::sample_contact;
#[cfg(test)]
pub use contact::MockContactRepository;
#[cfg(test)]
pub use email_token::MockEmailTokenRepository;
#[cfg(test)]
pub use note::MockNoteRepository;
#[cfg(test)]
pub use refresh_token::MockRefreshTokenRepository;
#[cfg(test)]
pub use role::MockRoleRepository;
#[cfg(test)]
pub use user::MockUserRepository;
