//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output with configurable level (`RUST_LOG` overrides)
//! - JSON-formatted local log files with rotation
//! - Macros that keep the field names of job and publish log lines uniform,
//!   so a run can be reconstructed from its log alone
//!
//! # Example
//!
//! ```no_run
//! use idsnap::logging::init_logging;
//! use idsnap::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log an export job state transition
///
/// # Example
///
/// ```no_run
/// use idsnap::log_job_transition;
///
/// log_job_transition!("ROLE", "r1", "job-1", "SUBMITTED", "RUNNING");
/// ```
#[macro_export]
macro_rules! log_job_transition {
    ($kind:expr, $item_id:expr, $job_id:expr, $from:expr, $to:expr) => {
        tracing::info!(
            kind = %$kind,
            item_id = %$item_id,
            job_id = %$job_id,
            from = %$from,
            to = %$to,
            "Export job state transition"
        );
    };
}

/// Log an item-scoped terminal failure with its full identifying context
///
/// # Example
///
/// ```no_run
/// use idsnap::log_item_failure;
///
/// log_item_failure!("SOURCE", "s9", "Active Directory", "job-7", "FAILED");
/// ```
#[macro_export]
macro_rules! log_item_failure {
    ($kind:expr, $item_id:expr, $item_name:expr, $job_id:expr, $reason:expr) => {
        tracing::error!(
            kind = %$kind,
            item_id = %$item_id,
            item_name = %$item_name,
            job_id = %$job_id,
            reason = %$reason,
            "Export item failed"
        );
    };
}

/// Log a batch publisher stage
///
/// # Example
///
/// ```no_run
/// use idsnap::log_publish_stage;
///
/// log_publish_stage!("TREE", "main", 12);
/// ```
#[macro_export]
macro_rules! log_publish_stage {
    ($stage:expr, $branch:expr, $files:expr) => {
        tracing::info!(
            stage = %$stage,
            branch = %$branch,
            files = $files,
            "Publish stage"
        );
    };
}

/// Log a retry attempt
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying request after error"
        );
    };
}
