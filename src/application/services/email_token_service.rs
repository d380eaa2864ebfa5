//! Email Token Service
//!
//! Opaque tokens for password reset and email verification links. The raw
//! token only ever leaves the server inside an email; the database keeps
//! its SHA-256 digest next to the security stamp it was issued against.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::config::EmailTokenSettings;
use crate::domain::{EmailToken, EmailTokenPurpose, EmailTokenRepository};
use crate::shared::crypto::{random_token_hex, sha256_hex};
use crate::shared::error::AppError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailTokenService: Send + Sync {
    /// Store a new token and return the raw value for the email link.
    /// Earlier unused tokens of the same purpose stop working.
    async fn create(
        &self,
        user_id: Uuid,
        identity_token: String,
        purpose: EmailTokenPurpose,
    ) -> Result<String, AppError>;

    /// `None` when the token is unknown, used, expired or for another
    /// purpose.
    async fn resolve(
        &self,
        raw_token: &str,
        purpose: EmailTokenPurpose,
    ) -> Result<Option<EmailToken>, AppError>;

    async fn mark_used(&self, id: Uuid) -> Result<(), AppError>;
}

/// EmailTokenService implementation
pub struct EmailTokenServiceImpl<R>
where
    R: EmailTokenRepository,
{
    token_repo: Arc<R>,
    settings: EmailTokenSettings,
}

impl<R> EmailTokenServiceImpl<R>
where
    R: EmailTokenRepository,
{
    pub fn new(token_repo: Arc<R>, settings: EmailTokenSettings) -> Self {
        Self {
            token_repo,
            settings,
        }
    }
}

#[async_trait]
impl<R> EmailTokenService for EmailTokenServiceImpl<R>
where
    R: EmailTokenRepository + 'static,
{
    async fn create(
        &self,
        user_id: Uuid,
        identity_token: String,
        purpose: EmailTokenPurpose,
    ) -> Result<String, AppError> {
        let raw = random_token_hex(self.settings.token_length_in_bytes);
        let token = EmailToken::new(
            user_id,
            sha256_hex(&raw),
            identity_token,
            purpose,
            Duration::hours(self.settings.lifetime_hours),
        );

        let revoked = self.token_repo.invalidate_for_user(user_id, purpose).await?;
        self.token_repo.create(&token).await?;
        debug!(
            user_id = %user_id,
            purpose = purpose.as_str(),
            revoked,
            "Email token issued"
        );

        Ok(raw)
    }

    async fn resolve(
        &self,
        raw_token: &str,
        purpose: EmailTokenPurpose,
    ) -> Result<Option<EmailToken>, AppError> {
        let token = self.token_repo.find_by_token(&sha256_hex(raw_token)).await?;
        Ok(token.filter(|t| t.is_redeemable(purpose, Utc::now())))
    }

    async fn mark_used(&self, id: Uuid) -> Result<(), AppError> {
        self.token_repo.mark_used(id).await
    }
}
