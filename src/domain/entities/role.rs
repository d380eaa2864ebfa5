//! Role entity and repository trait.
//!
//! Maps to the `roles`, `role_permissions` and `user_roles` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

pub const MAX_ROLE_NAME_LENGTH: usize = 50;

/// Represents a role that can be assigned to users.
///
/// Maps to the `roles` table:
/// - id: UUID PRIMARY KEY
/// - name: VARCHAR(50) NOT NULL UNIQUE
/// - description: VARCHAR(200) NULL
/// - is_system: BOOLEAN NOT NULL (seeded roles, cannot be renamed or deleted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
}

impl Role {
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name,
            description,
            is_system: false,
            created_at: Utc::now(),
        }
    }
}

/// A role with how many users hold it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleWithCount {
    pub role: Role,
    pub user_count: i64,
}

/// Repository trait for Role data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, AppError>;

    /// Case-insensitive name lookup.
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError>;

    async fn list_with_counts(&self) -> Result<Vec<RoleWithCount>, AppError>;

    async fn count_users(&self, role_id: Uuid) -> Result<i64, AppError>;

    async fn create(&self, role: &Role) -> Result<Role, AppError>;

    async fn update(&self, role: &Role) -> Result<Role, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    async fn permissions(&self, role_id: Uuid) -> Result<Vec<String>, AppError>;

    /// Replace the permission set of a role.
    async fn set_permissions(&self, role_id: Uuid, permissions: &[String])
        -> Result<(), AppError>;

    /// Role names held by a user.
    async fn user_roles(&self, user_id: Uuid) -> Result<Vec<String>, AppError>;

    /// Union of permissions granted through a user's roles.
    async fn user_permissions(&self, user_id: Uuid) -> Result<Vec<String>, AppError>;

    /// `(user_id, role_name)` pairs for a set of users.
    async fn roles_for_users(&self, user_ids: &[Uuid]) -> Result<Vec<(Uuid, String)>, AppError>;

    /// Add a role to a user. Assigning a held role is a no-op.
    async fn assign(&self, user_id: Uuid, role_id: Uuid) -> Result<(), AppError>;

    /// Returns false when the user did not hold the role.
    async fn remove(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, AppError>;

    /// Make `role_id` the user's only role.
    async fn replace_user_roles(&self, user_id: Uuid, role_id: Uuid) -> Result<(), AppError>;

    async fn user_ids_in_role(&self, role_id: Uuid) -> Result<Vec<Uuid>, AppError>;
}
