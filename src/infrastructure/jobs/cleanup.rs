//! Token cleanup jobs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::info;

use super::RecurringJob;
use crate::domain::{EmailTokenRepository, RefreshTokenRepository};
use crate::shared::error::AppError;

/// Deletes expired or used email tokens, hourly.
///
/// Tokens stay for an hour past expiry so a redemption that loaded the row
/// just before expiry can still finish.
pub struct ExpiredEmailTokenCleanupJob {
    tokens: Arc<dyn EmailTokenRepository>,
}

impl ExpiredEmailTokenCleanupJob {
    pub const ID: &'static str = "expired-email-token-cleanup";

    pub fn new(tokens: Arc<dyn EmailTokenRepository>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl RecurringJob for ExpiredEmailTokenCleanupJob {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn cron(&self) -> &'static str {
        "0 * * * *"
    }

    async fn execute(&self) -> Result<(), AppError> {
        let cutoff = Utc::now() - Duration::hours(1);
        let deleted = self.tokens.delete_expired(cutoff).await?;
        info!(count = deleted, "Deleted expired email tokens");
        Ok(())
    }
}

/// Deletes expired refresh tokens and used or invalidated tokens older than
/// a day, daily at 03:00 UTC.
pub struct ExpiredRefreshTokenCleanupJob {
    tokens: Arc<dyn RefreshTokenRepository>,
}

impl ExpiredRefreshTokenCleanupJob {
    pub const ID: &'static str = "expired-refresh-token-cleanup";

    pub fn new(tokens: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl RecurringJob for ExpiredRefreshTokenCleanupJob {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn cron(&self) -> &'static str {
        "0 3 * * *"
    }

    async fn execute(&self) -> Result<(), AppError> {
        let now = Utc::now();
        let deleted = self
            .tokens
            .delete_stale(now, now - Duration::days(1))
            .await?;
        info!(count = deleted, "Deleted stale refresh tokens");
        Ok(())
    }
}
