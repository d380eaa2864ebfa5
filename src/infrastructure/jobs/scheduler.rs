//! In-process cron scheduler.

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use cron::Schedule;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::RecurringJob;
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    Processing,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }
}

/// One run of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobExecution {
    pub job_id: String,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub duration_ms: Option<i64>,
    pub error: Option<String>,
}

/// Point-in-time view of a registered job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub id: String,
    pub cron: String,
    /// `None` while paused
    pub next_execution: Option<DateTime<Utc>>,
    pub last_execution: Option<DateTime<Utc>>,
    pub last_status: Option<JobStatus>,
    pub is_paused: bool,
    pub created_at: DateTime<Utc>,
    /// Newest first
    pub history: Vec<JobExecution>,
}

#[derive(Debug, Default)]
struct JobState {
    paused: bool,
    running: bool,
    last_execution: Option<DateTime<Utc>>,
    last_status: Option<JobStatus>,
    history: VecDeque<JobExecution>,
}

struct JobEntry {
    job: Arc<dyn RecurringJob>,
    schedule: Schedule,
    created_at: DateTime<Utc>,
    state: Mutex<JobState>,
}

impl JobEntry {
    fn snapshot(&self) -> JobSnapshot {
        let state = self.state.lock();
        JobSnapshot {
            id: self.job.id().to_string(),
            cron: self.job.cron().to_string(),
            next_execution: if state.paused {
                None
            } else {
                self.schedule.upcoming(Utc).next()
            },
            last_execution: state.last_execution,
            last_status: if state.running {
                Some(JobStatus::Processing)
            } else {
                state.last_status
            },
            is_paused: state.paused,
            created_at: self.created_at,
            history: state.history.iter().cloned().collect(),
        }
    }
}

/// Parse a five-field cron expression. The `cron` crate wants a leading
/// seconds field.
pub fn parse_cron(expr: &str) -> Result<Schedule, AppError> {
    Schedule::from_str(&format!("0 {}", expr.trim()))
        .map_err(|e| AppError::Internal(format!("Invalid cron expression '{}': {}", expr, e)))
}

/// Registry and runner for recurring jobs.
pub struct JobScheduler {
    jobs: DashMap<String, Arc<JobEntry>>,
    history_size: usize,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobScheduler {
    pub fn new(history_size: usize) -> Self {
        Self {
            jobs: DashMap::new(),
            history_size: history_size.max(1),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn register(&self, job: Arc<dyn RecurringJob>) -> Result<(), AppError> {
        let schedule = parse_cron(job.cron())?;
        let id = job.id().to_string();

        debug!(job = %id, cron = job.cron(), "Registering recurring job");
        self.jobs.insert(
            id,
            Arc::new(JobEntry {
                job,
                schedule,
                created_at: Utc::now(),
                state: Mutex::new(JobState::default()),
            }),
        );
        Ok(())
    }

    /// Spawn one timer task per registered job.
    pub fn start(&self) {
        let mut handles = self.handles.lock();
        for entry in self.jobs.iter() {
            let entry = Arc::clone(entry.value());
            let history_size = self.history_size;
            handles.push(tokio::spawn(run_loop(entry, history_size)));
        }
        info!(jobs = handles.len(), "Job scheduler started");
    }

    /// Abort all timer tasks. Runs already in flight finish on their own.
    pub fn shutdown(&self) {
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }

    /// All jobs, ordered by id.
    pub fn list(&self) -> Vec<JobSnapshot> {
        let mut jobs: Vec<JobSnapshot> = self.jobs.iter().map(|e| e.value().snapshot()).collect();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        jobs
    }

    pub fn get(&self, id: &str) -> Result<JobSnapshot, AppError> {
        Ok(self.entry(id)?.snapshot())
    }

    /// Start a run in the background. Returns immediately.
    pub fn trigger(&self, id: &str) -> Result<(), AppError> {
        let entry = self.entry(id)?;
        let history_size = self.history_size;
        info!(job = %id, "Job triggered manually");
        tokio::spawn(async move {
            run_entry(&entry, history_size).await;
        });
        Ok(())
    }

    /// Run a job inline and return the recorded execution, or `None` when a
    /// run was already in progress.
    pub async fn run_now(&self, id: &str) -> Result<Option<JobExecution>, AppError> {
        let entry = self.entry(id)?;
        Ok(run_entry(&entry, self.history_size).await)
    }

    pub fn pause(&self, id: &str) -> Result<(), AppError> {
        self.entry(id)?.state.lock().paused = true;
        info!(job = %id, "Job paused");
        Ok(())
    }

    pub fn resume(&self, id: &str) -> Result<(), AppError> {
        self.entry(id)?.state.lock().paused = false;
        info!(job = %id, "Job resumed");
        Ok(())
    }

    /// Unpause every job and forget past runs.
    pub fn restore(&self) {
        for entry in self.jobs.iter() {
            let mut state = entry.state.lock();
            state.paused = false;
            state.last_execution = None;
            state.last_status = None;
            state.history.clear();
        }
        info!("Job schedules restored to defaults");
    }

    fn entry(&self, id: &str) -> Result<Arc<JobEntry>, AppError> {
        self.jobs
            .get(id)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| AppError::NotFound(format!("Job '{}' not found.", id)))
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_loop(entry: Arc<JobEntry>, history_size: usize) {
    loop {
        let Some(next) = entry.schedule.upcoming(Utc).next() else {
            warn!(job = entry.job.id(), "Schedule has no upcoming occurrence");
            return;
        };

        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        if entry.state.lock().paused {
            debug!(job = entry.job.id(), "Skipping paused job");
            continue;
        }

        run_entry(&entry, history_size).await;
    }
}

async fn run_entry(entry: &JobEntry, history_size: usize) -> Option<JobExecution> {
    let job_id = entry.job.id();
    let started_at = Utc::now();
    {
        let mut state = entry.state.lock();
        if state.running {
            warn!(job = job_id, "Job already running, skipping");
            return None;
        }
        state.running = true;
    }

    let timer = Instant::now();
    let job = Arc::clone(&entry.job);
    let result = match tokio::spawn(async move { job.execute().await }).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(AppError::Internal("Job panicked".into())),
        Err(e) => Err(AppError::Internal(format!("Job task failed: {}", e))),
    };
    let elapsed = timer.elapsed();

    let (status, error) = match result {
        Ok(()) => {
            info!(job = job_id, duration_ms = elapsed.as_millis() as u64, "Job succeeded");
            (JobStatus::Succeeded, None)
        }
        Err(e) => {
            error!(job = job_id, error = %e, "Job failed");
            (JobStatus::Failed, Some(e.to_string()))
        }
    };
    metrics::record_job_execution(job_id, status.as_str(), elapsed.as_secs_f64());

    let execution = JobExecution {
        job_id: job_id.to_string(),
        status,
        started_at,
        duration_ms: Some(elapsed.as_millis() as i64),
        error,
    };

    let mut state = entry.state.lock();
    state.running = false;
    state.last_execution = Some(started_at);
    state.last_status = Some(status);
    state.history.push_front(execution.clone());
    state.history.truncate(history_size);

    Some(execution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        runs: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl RecurringJob for CountingJob {
        fn id(&self) -> &'static str {
            "counting"
        }

        fn cron(&self) -> &'static str {
            "*/5 * * * *"
        }

        async fn execute(&self) -> Result<(), AppError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(AppError::Internal("boom".into()))
            } else {
                Ok(())
            }
        }
    }

    fn scheduler_with(fail: bool, history: usize) -> (JobScheduler, Arc<CountingJob>) {
        let job = Arc::new(CountingJob {
            runs: AtomicUsize::new(0),
            fail,
        });
        let scheduler = JobScheduler::new(history);
        scheduler.register(job.clone()).unwrap();
        (scheduler, job)
    }

    #[test]
    fn test_parse_cron_accepts_five_fields() {
        assert!(parse_cron("0 * * * *").is_ok());
        assert!(parse_cron("0 3 * * *").is_ok());
        assert!(parse_cron("not a cron").is_err());
    }

    #[tokio::test]
    async fn test_run_records_history() {
        let (scheduler, job) = scheduler_with(false, 20);

        let execution = scheduler.run_now("counting").await.unwrap().unwrap();
        assert_eq!(execution.status, JobStatus::Succeeded);
        assert_eq!(job.runs.load(Ordering::SeqCst), 1);

        let snapshot = scheduler.get("counting").unwrap();
        assert_eq!(snapshot.last_status, Some(JobStatus::Succeeded));
        assert_eq!(snapshot.history.len(), 1);
        assert!(snapshot.next_execution.is_some());
    }

    #[tokio::test]
    async fn test_failure_is_recorded_not_propagated() {
        let (scheduler, _) = scheduler_with(true, 20);

        let execution = scheduler.run_now("counting").await.unwrap().unwrap();
        assert_eq!(execution.status, JobStatus::Failed);
        assert!(execution.error.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let (scheduler, _) = scheduler_with(false, 3);
        for _ in 0..5 {
            scheduler.run_now("counting").await.unwrap();
        }
        assert_eq!(scheduler.get("counting").unwrap().history.len(), 3);
    }

    #[tokio::test]
    async fn test_pause_resume_and_restore() {
        let (scheduler, _) = scheduler_with(false, 20);
        scheduler.run_now("counting").await.unwrap();

        scheduler.pause("counting").unwrap();
        let paused = scheduler.get("counting").unwrap();
        assert!(paused.is_paused);
        assert!(paused.next_execution.is_none());

        scheduler.resume("counting").unwrap();
        assert!(!scheduler.get("counting").unwrap().is_paused);

        scheduler.pause("counting").unwrap();
        scheduler.restore();
        let restored = scheduler.get("counting").unwrap();
        assert!(!restored.is_paused);
        assert!(restored.history.is_empty());
        assert!(restored.last_execution.is_none());
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let scheduler = JobScheduler::new(20);
        assert!(matches!(scheduler.get("nope"), Err(AppError::NotFound(_))));
        assert!(matches!(scheduler.trigger("nope"), Err(AppError::NotFound(_))));
        assert!(matches!(scheduler.pause("nope"), Err(AppError::NotFound(_))));
    }

    struct PanickingJob;

    #[async_trait]
    impl RecurringJob for PanickingJob {
        fn id(&self) -> &'static str {
            "panicking"
        }

        fn cron(&self) -> &'static str {
            "0 * * * *"
        }

        async fn execute(&self) -> Result<(), AppError> {
            panic!("cleanup exploded");
        }
    }

    #[tokio::test]
    async fn test_panicking_job_is_recorded_and_can_run_again() {
        let scheduler = JobScheduler::new(20);
        scheduler.register(Arc::new(PanickingJob)).unwrap();

        let execution = scheduler.run_now("panicking").await.unwrap().unwrap();
        assert_eq!(execution.status, JobStatus::Failed);
        assert_eq!(execution.error.as_deref(), Some("Internal error: Job panicked"));

        let snapshot = scheduler.get("panicking").unwrap();
        assert_eq!(snapshot.last_status, Some(JobStatus::Failed));

        let again = scheduler.run_now("panicking").await.unwrap();
        assert!(again.is_some());
        assert_eq!(scheduler.get("panicking").unwrap().history.len(), 2);
    }

    #[tokio::test]
    async fn test_trigger_runs_in_background() {
        let (scheduler, job) = scheduler_with(false, 20);
        scheduler.trigger("counting").unwrap();

        for _ in 0..50 {
            if job.runs.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(job.runs.load(Ordering::SeqCst), 1);
    }
}
