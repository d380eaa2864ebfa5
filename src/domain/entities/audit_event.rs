//! Audit event entity and repository trait.
//!
//! Maps to the `audit_events` table. Rows are append-only and are not
//! foreign-keyed to users so history survives account deletion.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Recorded action names. Stored as their string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    LoginSuccess,
    LoginFailure,
    Logout,
    Register,
    PasswordChange,
    PasswordResetRequest,
    PasswordReset,
    EmailVerification,
    ResendVerificationEmail,
    ProfileUpdate,
    AccountDeletion,
    AdminCreateUser,
    AdminLockUser,
    AdminUnlockUser,
    AdminDeleteUser,
    AdminVerifyEmail,
    AdminSendPasswordReset,
    AdminAssignRole,
    AdminRemoveRole,
    AdminCreateRole,
    AdminUpdateRole,
    AdminDeleteRole,
    AdminSetRolePermissions,
    ContactCreate,
    ContactUpdate,
    ContactDelete,
    ContactFavorite,
}

impl AuditAction {
    /// Actions that describe contact records rather than the account. They
    /// are left out of a user's own activity feed.
    pub const CONTACT_ACTIONS: [AuditAction; 4] = [
        AuditAction::ContactCreate,
        AuditAction::ContactUpdate,
        AuditAction::ContactDelete,
        AuditAction::ContactFavorite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoginSuccess => "LoginSuccess",
            Self::LoginFailure => "LoginFailure",
            Self::Logout => "Logout",
            Self::Register => "Register",
            Self::PasswordChange => "PasswordChange",
            Self::PasswordResetRequest => "PasswordResetRequest",
            Self::PasswordReset => "PasswordReset",
            Self::EmailVerification => "EmailVerification",
            Self::ResendVerificationEmail => "ResendVerificationEmail",
            Self::ProfileUpdate => "ProfileUpdate",
            Self::AccountDeletion => "AccountDeletion",
            Self::AdminCreateUser => "AdminCreateUser",
            Self::AdminLockUser => "AdminLockUser",
            Self::AdminUnlockUser => "AdminUnlockUser",
            Self::AdminDeleteUser => "AdminDeleteUser",
            Self::AdminVerifyEmail => "AdminVerifyEmail",
            Self::AdminSendPasswordReset => "AdminSendPasswordReset",
            Self::AdminAssignRole => "AdminAssignRole",
            Self::AdminRemoveRole => "AdminRemoveRole",
            Self::AdminCreateRole => "AdminCreateRole",
            Self::AdminUpdateRole => "AdminUpdateRole",
            Self::AdminDeleteRole => "AdminDeleteRole",
            Self::AdminSetRolePermissions => "AdminSetRolePermissions",
            Self::ContactCreate => "ContactCreate",
            Self::ContactUpdate => "ContactUpdate",
            Self::ContactDelete => "ContactDelete",
            Self::ContactFavorite => "ContactFavorite",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity type names used in `target_entity_type`.
pub mod entity_types {
    pub const CONTACT: &str = "Contact";
    pub const USER: &str = "User";
    pub const ROLE: &str = "Role";
}

pub const MAX_ACTION_LENGTH: usize = 50;
pub const MAX_ENTITY_TYPE_LENGTH: usize = 50;

/// A single audit log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub target_entity_type: Option<String>,
    pub target_entity_id: Option<Uuid>,
    /// JSON document serialized as text
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        user_id: Option<Uuid>,
        target_entity_type: Option<&str>,
        target_entity_id: Option<Uuid>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            action: action.as_str().to_string(),
            target_entity_type: target_entity_type
                .map(|t| t.chars().take(MAX_ENTITY_TYPE_LENGTH).collect()),
            target_entity_id,
            metadata: metadata.map(|m| m.to_string()),
            created_at: Utc::now(),
        }
    }
}

/// Repository trait for AuditEvent data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditEventRepository: Send + Sync {
    async fn insert(&self, event: &AuditEvent) -> Result<(), AppError>;

    /// Events where the user is actor or target, newest first, skipping
    /// `exclude_actions`.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        exclude_actions: Vec<String>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AuditEvent>, i64), AppError>;

    /// Events about one entity, newest first.
    async fn list_for_entity(
        &self,
        entity_type: String,
        entity_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AuditEvent>, i64), AppError>;
}
