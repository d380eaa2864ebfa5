//! Recurring background jobs.
//!
//! Each registered job runs on its own tokio task that sleeps until the
//! next cron occurrence. Job state lives in memory and is lost on restart.

mod cleanup;
mod scheduler;

pub use cleanup::{ExpiredEmailTokenCleanupJob, ExpiredRefreshTokenCleanupJob};
pub use scheduler::{JobExecution, JobScheduler, JobSnapshot, JobStatus};

use async_trait::async_trait;

use crate::shared::error::AppError;

/// A job the scheduler runs on a cron schedule.
#[async_trait]
pub trait RecurringJob: Send + Sync {
    /// Stable identifier, e.g. `expired-email-token-cleanup`.
    fn id(&self) -> &'static str;

    /// Five-field cron expression (minute hour day month weekday).
    fn cron(&self) -> &'static str;

    async fn execute(&self) -> Result<(), AppError>;
}
