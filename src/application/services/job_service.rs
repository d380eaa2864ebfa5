//! Job Service
//!
//! Management view over the recurring job scheduler.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::dto::response::{RecurringJobDetailOutput, RecurringJobOutput};
use crate::infrastructure::jobs::JobScheduler;
use crate::shared::error::AppError;

#[async_trait]
pub trait JobService: Send + Sync {
    async fn list(&self) -> Result<Vec<RecurringJobOutput>, AppError>;

    async fn get(&self, id: &str) -> Result<RecurringJobDetailOutput, AppError>;

    async fn trigger(&self, id: &str) -> Result<(), AppError>;

    async fn pause(&self, id: &str) -> Result<(), AppError>;

    async fn resume(&self, id: &str) -> Result<(), AppError>;

    /// Unpause all jobs and clear their history.
    async fn restore(&self) -> Result<(), AppError>;
}

pub struct JobServiceImpl {
    scheduler: Arc<JobScheduler>,
}

impl JobServiceImpl {
    pub fn new(scheduler: Arc<JobScheduler>) -> Self {
        Self { scheduler }
    }
}

#[async_trait]
impl JobService for JobServiceImpl {
    async fn list(&self) -> Result<Vec<RecurringJobOutput>, AppError> {
        Ok(self
            .scheduler
            .list()
            .into_iter()
            .map(RecurringJobOutput::from)
            .collect())
    }

    async fn get(&self, id: &str) -> Result<RecurringJobDetailOutput, AppError> {
        Ok(self.scheduler.get(id)?.into())
    }

    async fn trigger(&self, id: &str) -> Result<(), AppError> {
        self.scheduler.trigger(id)
    }

    async fn pause(&self, id: &str) -> Result<(), AppError> {
        self.scheduler.pause(id)
    }

    async fn resume(&self, id: &str) -> Result<(), AppError> {
        self.scheduler.resume(id)
    }

    async fn restore(&self) -> Result<(), AppError> {
        self.scheduler.restore();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::jobs::RecurringJob;

    struct NoopJob;

    #[async_trait]
    impl RecurringJob for NoopJob {
        fn id(&self) -> &'static str {
            "noop"
        }

        fn cron(&self) -> &'static str {
            "0 * * * *"
        }

        async fn execute(&self) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn service() -> JobServiceImpl {
        let scheduler = JobScheduler::new(5);
        scheduler.register(Arc::new(NoopJob)).unwrap();
        JobServiceImpl::new(Arc::new(scheduler))
    }

    #[tokio::test]
    async fn test_pause_and_restore() {
        let service = service();

        service.pause("noop").await.unwrap();
        let job = service.get("noop").await.unwrap();
        assert!(job.job.is_paused);
        assert!(job.job.next_execution.is_none());

        service.restore().await.unwrap();
        let jobs = service.list().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert!(!jobs[0].is_paused);
        assert!(jobs[0].next_execution.is_some());
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let service = service();
        assert!(matches!(
            service.trigger("missing").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.get("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
