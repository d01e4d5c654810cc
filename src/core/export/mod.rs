//! Export orchestration
//!
//! - [`poller`] - Job poller state machine for one item
//! - [`scheduler`] - Bounded fan-out over all items with a join barrier
//! - [`summary`] - Per-run export outcome

pub mod poller;
pub mod scheduler;
pub mod summary;

pub use poller::{FailureReason, JobFailure, JobPoller, JobState, PollSettings};
pub use scheduler::ExportScheduler;
pub use summary::{ExportError, ExportErrorType, ExportSummary};
