//! Opaque email token entity and repository trait.
//!
//! Links in password reset and verification emails carry a random token.
//! The server stores its SHA-256 digest together with the identity token it
//! stands for (the user's security stamp at issuance), so neither the
//! identity token nor the email address appears in URLs.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::shared::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTokenPurpose {
    PasswordReset,
    EmailVerification,
}

impl EmailTokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PasswordReset => "PasswordReset",
            Self::EmailVerification => "EmailVerification",
        }
    }
}

impl FromStr for EmailTokenPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PasswordReset" => Ok(Self::PasswordReset),
            "EmailVerification" => Ok(Self::EmailVerification),
            other => Err(format!("Unknown email token purpose '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailToken {
    pub id: Uuid,
    /// SHA-256 hex digest of the raw token
    pub token: String,
    pub identity_token: String,
    pub purpose: EmailTokenPurpose,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl EmailToken {
    pub fn new(
        user_id: Uuid,
        token_hash: String,
        identity_token: String,
        purpose: EmailTokenPurpose,
        lifetime: chrono::Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            token: token_hash,
            identity_token,
            purpose,
            user_id,
            created_at: now,
            expires_at: now + lifetime,
            used: false,
        }
    }

    /// Redeemable for `purpose` at `now`.
    pub fn is_redeemable(&self, purpose: EmailTokenPurpose, now: DateTime<Utc>) -> bool {
        !self.used && self.purpose == purpose && self.expires_at > now
    }
}

/// Repository trait for EmailToken data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailTokenRepository: Send + Sync {
    async fn create(&self, token: &EmailToken) -> Result<(), AppError>;

    async fn find_by_token(&self, token_hash: &str) -> Result<Option<EmailToken>, AppError>;

    async fn mark_used(&self, id: Uuid) -> Result<(), AppError>;

    /// Mark every unused token of a user for `purpose` as used.
    async fn invalidate_for_user(
        &self,
        user_id: Uuid,
        purpose: EmailTokenPurpose,
    ) -> Result<u64, AppError>;

    /// Delete tokens that expired before `cutoff` or were used.
    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(purpose: EmailTokenPurpose, used: bool, expires_in: Duration) -> EmailToken {
        let now = Utc::now();
        EmailToken {
            id: Uuid::new_v4(),
            token: "digest".into(),
            identity_token: "STAMP".into(),
            purpose,
            user_id: Uuid::new_v4(),
            created_at: now,
            expires_at: now + expires_in,
            used,
        }
    }

    #[test]
    fn test_redeemable() {
        let t = token(EmailTokenPurpose::PasswordReset, false, Duration::hours(1));
        assert!(t.is_redeemable(EmailTokenPurpose::PasswordReset, Utc::now()));
    }

    #[test]
    fn test_wrong_purpose_not_redeemable() {
        let t = token(EmailTokenPurpose::PasswordReset, false, Duration::hours(1));
        assert!(!t.is_redeemable(EmailTokenPurpose::EmailVerification, Utc::now()));
    }

    #[test]
    fn test_used_or_expired_not_redeemable() {
        let used = token(EmailTokenPurpose::EmailVerification, true, Duration::hours(1));
        let expired = token(EmailTokenPurpose::EmailVerification, false, Duration::hours(-1));
        assert!(!used.is_redeemable(EmailTokenPurpose::EmailVerification, Utc::now()));
        assert!(!expired.is_redeemable(EmailTokenPurpose::EmailVerification, Utc::now()));
    }

    #[test]
    fn test_purpose_round_trip() {
        for p in [EmailTokenPurpose::PasswordReset, EmailTokenPurpose::EmailVerification] {
            assert_eq!(p.as_str().parse::<EmailTokenPurpose>().unwrap(), p);
        }
    }
}
