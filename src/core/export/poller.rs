//! Job poller - drives one export job to a terminal state
//!
//! ```text
//! SUBMITTED -> RUNNING -> { COMPLETE | FAILED | CANCELLED | TIMED_OUT }
//! ```
//!
//! Status polls that fail are logged and retried on the next tick; only an
//! explicit terminal status from the backend or the deadline ends the loop.

use crate::adapters::identity::{BackendJobStatus, ExportBackend};
use crate::config::ExportConfig;
use crate::domain::{EntityKind, InventoryItem, ItemId, JobId, Lookup};
use crate::log_job_transition;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Export job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Running,
    Complete,
    Failed,
    Cancelled,
    TimedOut,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Submitted | Self::Running)
    }
}

impl From<BackendJobStatus> for JobState {
    fn from(status: BackendJobStatus) -> Self {
        match status {
            BackendJobStatus::Running => Self::Running,
            BackendJobStatus::Complete => Self::Complete,
            BackendJobStatus::Failed => Self::Failed,
            BackendJobStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "SUBMITTED",
            Self::Running => "RUNNING",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::TimedOut => "TIMED_OUT",
        };
        f.write_str(s)
    }
}

/// Why an item produced no artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The backend refused or never acknowledged the job
    SubmitFailed(String),
    /// Backend reported FAILED
    Failed,
    /// Backend reported CANCELLED
    Cancelled,
    /// No terminal status before the deadline
    TimedOut(Duration),
    /// Job completed but its result could not be retrieved
    ResultUnavailable(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubmitFailed(msg) => write!(f, "SUBMIT_FAILED: {msg}"),
            Self::Failed => f.write_str("FAILED"),
            Self::Cancelled => f.write_str("CANCELLED"),
            Self::TimedOut(after) => write!(f, "TIMED_OUT after {}s", after.as_secs()),
            Self::ResultUnavailable(msg) => write!(f, "RESULT_UNAVAILABLE: {msg}"),
        }
    }
}

/// Item-scoped terminal failure
#[derive(Debug, Clone)]
pub struct JobFailure {
    pub kind: EntityKind,
    pub item_id: ItemId,
    pub item_name: String,
    /// Absent when submission itself failed
    pub job_id: Option<JobId>,
    pub reason: FailureReason,
}

impl JobFailure {
    pub fn new(item: &InventoryItem, job_id: Option<JobId>, reason: FailureReason) -> Self {
        Self {
            kind: item.kind,
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            job_id,
            reason,
        }
    }

    /// Job id for log lines, `-` when none was assigned
    pub fn job_label(&self) -> &str {
        self.job_id.as_ref().map(JobId::as_str).unwrap_or("-")
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} item {} (job {}) failed: {}",
            self.kind,
            self.item_id,
            self.job_label(),
            self.reason
        )
    }
}

impl std::error::Error for JobFailure {}

/// Polling cadence for export jobs
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSettings {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            timeout: config.poll_timeout(),
        }
    }
}

/// Runs submit, poll and fetch for one item
#[derive(Clone)]
pub struct JobPoller {
    backend: Arc<dyn ExportBackend>,
    settings: PollSettings,
}

impl JobPoller {
    pub fn new(backend: Arc<dyn ExportBackend>, settings: PollSettings) -> Self {
        Self { backend, settings }
    }

    /// Export `item` through a single job scoped to its id
    ///
    /// Returns the job's result objects; an empty result is `Ok` with no objects.
    pub async fn run(&self, item: &InventoryItem) -> Result<Vec<Value>, JobFailure> {
        let description = format!("Exporting {}", item.kind);
        let job_id = self
            .backend
            .submit_export(item.kind, std::slice::from_ref(&item.id), &description)
            .await
            .map_err(|e| JobFailure::new(item, None, FailureReason::SubmitFailed(e.to_string())))?;

        log_job_transition!(item.kind, item.id, job_id, "NEW", JobState::Submitted);

        match self.await_terminal(item, &job_id).await {
            JobState::Complete => self.fetch(item, job_id).await,
            JobState::Failed => Err(JobFailure::new(item, Some(job_id), FailureReason::Failed)),
            JobState::Cancelled => {
                Err(JobFailure::new(item, Some(job_id), FailureReason::Cancelled))
            }
            _ => Err(JobFailure::new(
                item,
                Some(job_id),
                FailureReason::TimedOut(self.settings.timeout),
            )),
        }
    }

    /// Poll until a terminal state; at most one status request is in flight
    async fn await_terminal(&self, item: &InventoryItem, job_id: &JobId) -> JobState {
        let deadline = Instant::now() + self.settings.timeout;
        let mut state = JobState::Submitted;

        loop {
            match self.backend.get_status(job_id).await {
                Ok(status) => {
                    let next = JobState::from(status);
                    if next != state {
                        log_job_transition!(item.kind, item.id, job_id, state, next);
                        state = next;
                    }
                    if state.is_terminal() {
                        return state;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        kind = %item.kind,
                        item_id = %item.id,
                        job_id = %job_id,
                        error = %e,
                        "Status poll failed, will poll again"
                    );
                }
            }

            let now = Instant::now();
            if now >= deadline {
                log_job_transition!(item.kind, item.id, job_id, state, JobState::TimedOut);
                return JobState::TimedOut;
            }
            tokio::time::sleep_until((now + self.settings.interval).min(deadline)).await;
        }
    }

    async fn fetch(&self, item: &InventoryItem, job_id: JobId) -> Result<Vec<Value>, JobFailure> {
        match self.backend.get_result(&job_id).await {
            Ok(Lookup::Found(objects)) => {
                if objects.is_empty() {
                    tracing::warn!(
                        kind = %item.kind,
                        item_id = %item.id,
                        job_id = %job_id,
                        "Export job completed with an empty result"
                    );
                }
                Ok(objects)
            }
            Ok(Lookup::NotFound(what)) => Err(JobFailure::new(
                item,
                Some(job_id),
                FailureReason::ResultUnavailable(format!("{what} not found")),
            )),
            Err(e) => Err(JobFailure::new(
                item,
                Some(job_id),
                FailureReason::ResultUnavailable(e.to_string()),
            )),
        }
    }
}
