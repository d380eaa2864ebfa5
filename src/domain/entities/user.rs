//! User entity and repository trait.
//!
//! Maps to the `users` table. The email doubles as the login name and is
//! stored lowercased.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::crypto::new_security_stamp;
use crate::shared::error::AppError;

/// Represents a user account.
///
/// Maps to the `users` table:
/// - id: UUID PRIMARY KEY
/// - email: VARCHAR(255) NOT NULL UNIQUE
/// - password_hash: VARCHAR(255) NULL (NULL for invited users)
/// - security_stamp: VARCHAR(64) NOT NULL, rotated on credential changes
/// - lockout_end: TIMESTAMPTZ NULL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,

    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub email_confirmed: bool,
    pub lockout_enabled: bool,
    pub lockout_end: Option<DateTime<Utc>>,
    pub access_failed_count: i32,

    /// Changes whenever issued tokens must stop working.
    #[serde(skip_serializing)]
    pub security_stamp: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(email: &str, password_hash: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            email: normalize_email(email),
            password_hash,
            first_name: None,
            last_name: None,
            phone_number: None,
            bio: None,
            avatar_url: None,
            email_confirmed: false,
            lockout_enabled: true,
            lockout_end: None,
            access_failed_count: 0,
            security_stamp: new_security_stamp(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Whether the account is locked at `now`.
    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        self.lockout_enabled && self.lockout_end.is_some_and(|end| end > now)
    }

    /// Count a failed login. Returns true when this failure locked the
    /// account.
    pub fn record_failed_login(
        &mut self,
        max_attempts: i32,
        lockout: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.lockout_enabled {
            return false;
        }

        self.access_failed_count += 1;
        if self.access_failed_count >= max_attempts {
            self.lockout_end = Some(now + lockout);
            self.access_failed_count = 0;
            return true;
        }
        false
    }

    pub fn reset_failed_logins(&mut self) {
        self.access_failed_count = 0;
        self.lockout_end = None;
    }

    /// Lock until `until`, or for a century when `None`.
    pub fn lock(&mut self, until: Option<DateTime<Utc>>) {
        self.lockout_enabled = true;
        self.lockout_end = Some(until.unwrap_or_else(|| Utc::now() + Duration::days(36_500)));
        self.rotate_security_stamp();
    }

    pub fn unlock(&mut self) {
        self.reset_failed_logins();
    }

    pub fn rotate_security_stamp(&mut self) {
        self.security_stamp = new_security_stamp();
        self.updated_at = Some(Utc::now());
    }

    pub fn full_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
            (Some(f), None) => Some(f.to_string()),
            (None, Some(l)) => Some(l.to_string()),
            (None, None) => None,
        }
    }
}

/// Lowercase and trim an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Repository trait for User data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Case-insensitive email lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    async fn create(&self, user: &User) -> Result<User, AppError>;

    /// Persist all mutable columns.
    async fn update(&self, user: &User) -> Result<User, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    /// Page through users, optionally filtered by email or name.
    async fn list(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), AppError>;

    async fn get_security_stamp(&self, id: Uuid) -> Result<Option<String>, AppError>;

    /// Rotate the stamp of every listed user.
    async fn rotate_security_stamps(&self, ids: &[Uuid]) -> Result<(), AppError>;
}
