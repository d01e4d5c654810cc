//! Identity platform collaborator traits
//!
//! [`InventorySource`] enumerates what exists; [`ExportBackend`] runs the
//! job-based configuration export and serves rule source code directly.
//! The pipeline only talks to these traits, so tests drive it with in-memory
//! fakes while production uses [`super::IdentityClient`].

use crate::domain::{EntityKind, InventoryItem, ItemId, JobId, Lookup, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Status of an export job as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendJobStatus {
    /// Accepted or in progress
    Running,
    /// Finished; the result can be fetched
    Complete,
    /// Finished unsuccessfully
    Failed,
    /// Cancelled on the backend
    Cancelled,
}

impl BackendJobStatus {
    /// Maps the platform's wire status; `None` for anything unrecognized
    pub fn from_wire(status: &str) -> Option<Self> {
        match status {
            "NOT_STARTED" | "IN_PROGRESS" | "RUNNING" => Some(Self::Running),
            "COMPLETE" => Some(Self::Complete),
            "FAILED" => Some(Self::Failed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether no further status changes are expected
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for BackendJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "RUNNING",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Source of exportable items, per kind
///
/// A failure for one kind must not stop the caller from listing the others.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Lists every item of `kind`
    async fn list(&self, kind: EntityKind) -> Result<Vec<InventoryItem>>;
}

/// Job-based configuration export service
#[async_trait]
pub trait ExportBackend: Send + Sync {
    /// Starts one export job scoped to exactly `ids`
    async fn submit_export(
        &self,
        kind: EntityKind,
        ids: &[ItemId],
        description: &str,
    ) -> Result<JobId>;

    /// Current status of a submitted job
    async fn get_status(&self, job_id: &JobId) -> Result<BackendJobStatus>;

    /// Objects produced by a completed job
    async fn get_result(&self, job_id: &JobId) -> Result<Lookup<Vec<Value>>>;

    /// Rule source code fetched directly by id; rules are not part of export payloads
    async fn get_rule(&self, id: &ItemId) -> Result<Lookup<Value>>;
}
