//! Refresh token entity and repository trait.
//!
//! Maps to the `refresh_tokens` table. Only the SHA-256 digest of a token
//! is stored.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::shared::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshToken {
    pub id: Uuid,
    /// SHA-256 hex digest of the opaque token
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub invalidated: bool,
    /// Issued with "remember me"; the client keeps it across sessions
    pub persistent: bool,
}

impl RefreshToken {
    pub fn new(user_id: Uuid, token_hash: String, lifetime: Duration, persistent: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            token: token_hash,
            user_id,
            created_at: now,
            expires_at: now + lifetime,
            used: false,
            invalidated: false,
            persistent,
        }
    }

    /// Usable for one rotation.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.invalidated && self.expires_at > now
    }

    /// Presented again after rotation or revocation.
    pub fn is_replayed(&self) -> bool {
        self.used || self.invalidated
    }
}

/// Repository trait for RefreshToken data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn create(&self, token: &RefreshToken) -> Result<(), AppError>;

    async fn find_by_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, AppError>;

    /// Flag a token as consumed by rotation. Returns false when it was
    /// already used, so concurrent refreshes cannot both succeed.
    async fn mark_used(&self, id: Uuid) -> Result<bool, AppError>;

    /// Invalidate every live token of a user.
    async fn invalidate_all_for_user(&self, user_id: Uuid) -> Result<u64, AppError>;

    /// Delete expired tokens and used/invalidated tokens older than `cutoff`.
    async fn delete_stale(&self, now: DateTime<Utc>, cutoff: DateTime<Utc>)
        -> Result<u64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_token() {
        let now = Utc::now();
        let token = RefreshToken::new(Uuid::nil(), "h".into(), Duration::days(7), false);
        assert!(token.is_active(now));
        assert!(!token.is_active(now + Duration::days(8)));
    }

    #[test]
    fn test_used_token_is_replayed() {
        let mut token = RefreshToken::new(Uuid::nil(), "h".into(), Duration::days(7), true);
        assert!(!token.is_replayed());
        token.used = true;
        assert!(token.is_replayed());
        assert!(!token.is_active(Utc::now()));
    }
}
