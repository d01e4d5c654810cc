//! Export summary and reporting
//!
//! Tracks per-item outcomes of one export run so the caller can tell which
//! items made it into the snapshot and which did not.

use super::poller::{FailureReason, JobFailure};
use crate::domain::EntityKind;
use std::collections::BTreeMap;
use std::time::Duration;

/// Summary of an export run
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Items handed to the scheduler
    pub total_items: usize,

    /// Items whose job completed and whose artifacts were written
    pub exported_items: usize,

    /// Items that ended in an item-scoped failure
    pub failed_items: usize,

    /// Items never started because a shutdown was requested
    pub skipped_items: usize,

    /// Completed items whose result held no objects
    pub empty_results: usize,

    /// Files written (same-name collisions count once per write)
    pub artifacts_written: usize,

    /// Files written per kind
    pub artifacts_by_kind: BTreeMap<EntityKind, usize>,

    /// Duration of the export
    pub duration: Duration,

    /// Errors encountered during export
    pub errors: Vec<ExportError>,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new() -> Self {
        Self {
            total_items: 0,
            exported_items: 0,
            failed_items: 0,
            skipped_items: 0,
            empty_results: 0,
            artifacts_written: 0,
            artifacts_by_kind: BTreeMap::new(),
            duration: Duration::from_secs(0),
            errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: ExportError) {
        self.errors.push(error);
    }

    /// Record a completed item and the artifacts it produced
    pub fn record_exported(&mut self, kind: EntityKind, artifacts: usize) {
        self.exported_items += 1;
        if artifacts == 0 {
            self.empty_results += 1;
        }
        self.artifacts_written += artifacts;
        *self.artifacts_by_kind.entry(kind).or_insert(0) += artifacts;
    }

    /// Record an item-scoped failure
    pub fn record_failure(&mut self, failure: &JobFailure) {
        self.failed_items += 1;
        self.add_error(ExportError::from(failure));
    }

    /// Check if the export was successful (no failures)
    pub fn is_successful(&self) -> bool {
        self.failed_items == 0 && self.errors.is_empty()
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.exported_items + self.failed_items;
        if attempted == 0 {
            return 100.0;
        }
        (self.exported_items as f64 / attempted as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total_items = self.total_items,
            exported = self.exported_items,
            failed = self.failed_items,
            skipped = self.skipped_items,
            empty_results = self.empty_results,
            artifacts = self.artifacts_written,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Export completed"
        );

        for (kind, count) in &self.artifacts_by_kind {
            tracing::debug!(kind = %kind, artifacts = count, "Artifacts per kind");
        }

        if !self.errors.is_empty() {
            tracing::warn!(
                error_count = self.errors.len(),
                "Export completed with errors"
            );
            for error in &self.errors {
                tracing::warn!(
                    error_type = ?error.error_type,
                    message = %error.message,
                    context = ?error.context,
                    "Export error"
                );
            }
        }
    }
}

impl Default for ExportSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of export error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportErrorType {
    /// Inventory listing for a kind failed
    Listing,
    /// Job submission failed
    Submit,
    /// Backend reported FAILED
    JobFailed,
    /// Backend reported CANCELLED
    JobCancelled,
    /// No terminal status before the deadline
    TimedOut,
    /// Completed job result could not be fetched
    ResultUnavailable,
    /// Writing artifacts failed
    Materialize,
    /// Worker task panicked or was aborted
    Task,
}

/// Export error with context
#[derive(Debug, Clone)]
pub struct ExportError {
    /// Type of error
    pub error_type: ExportErrorType,

    /// Error message
    pub message: String,

    /// Optional context (e.g. kind, item id, job id)
    pub context: Option<String>,
}

impl ExportError {
    /// Create a new export error
    pub fn new(error_type: ExportErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            context: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }
}

impl From<&JobFailure> for ExportError {
    fn from(failure: &JobFailure) -> Self {
        let error_type = match failure.reason {
            FailureReason::SubmitFailed(_) => ExportErrorType::Submit,
            FailureReason::Failed => ExportErrorType::JobFailed,
            FailureReason::Cancelled => ExportErrorType::JobCancelled,
            FailureReason::TimedOut(_) => ExportErrorType::TimedOut,
            FailureReason::ResultUnavailable(_) => ExportErrorType::ResultUnavailable,
        };
        ExportError::new(error_type, failure.reason.to_string()).with_context(format!(
            "kind={}, item_id={}, job_id={}",
            failure.kind,
            failure.item_id,
            failure.job_label()
        ))
    }
}
