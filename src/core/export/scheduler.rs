//! Export scheduler - bounded fan-out of job pollers with a join barrier
//!
//! One task per inventory item, at most `workers` of them holding a permit
//! at a time. A permit is held for the item's whole lifetime (submit, poll,
//! fetch, write), so the ceiling bounds outstanding backend jobs. Polling
//! sleeps are async and do not tie up runtime threads.
//!
//! `run_all` returns only after every launched task has finished; the
//! publisher treats the export root as a snapshot and must not start earlier.

use super::poller::{FailureReason, JobFailure, JobPoller, PollSettings};
use super::summary::{ExportError, ExportErrorType, ExportSummary};
use crate::adapters::identity::ExportBackend;
use crate::config::ExportConfig;
use crate::core::materialize::Materializer;
use crate::domain::{InventoryItem, Lookup};
use crate::log_item_failure;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;

/// Terminal outcome of one item
#[derive(Debug)]
enum ItemOutcome {
    Exported { item: InventoryItem, artifacts: usize },
    Failed(JobFailure),
    WriteFailed { item: InventoryItem, error: String },
}

/// Fans out exports under a worker ceiling
pub struct ExportScheduler {
    backend: Arc<dyn ExportBackend>,
    materializer: Materializer,
    poller: JobPoller,
    workers: usize,
    shutdown_grace: Duration,
}

impl ExportScheduler {
    pub fn new(
        backend: Arc<dyn ExportBackend>,
        materializer: Materializer,
        config: &ExportConfig,
    ) -> Self {
        Self {
            poller: JobPoller::new(backend.clone(), PollSettings::from_config(config)),
            backend,
            materializer,
            workers: config.workers.max(1),
            shutdown_grace: Duration::from_secs(config.shutdown_timeout_secs),
        }
    }

    /// Export every item and wait for all of them to settle
    ///
    /// Once `shutdown` turns true no further items are launched; they are
    /// counted as skipped. Items already running get `shutdown_timeout_secs`
    /// to finish before they are aborted.
    pub async fn run_all(
        &self,
        items: Vec<InventoryItem>,
        mut shutdown: watch::Receiver<bool>,
    ) -> ExportSummary {
        let start = std::time::Instant::now();
        let mut summary = ExportSummary::new();
        summary.total_items = items.len();

        tracing::info!(items = items.len(), workers = self.workers, "Starting export jobs");

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut join_set = JoinSet::new();
        let mut queue = items.into_iter();

        while let Some(item) = queue.next() {
            let Some(permit) = acquire(&semaphore, &mut shutdown).await else {
                summary.skipped_items = 1 + queue.len();
                tracing::warn!(
                    skipped = summary.skipped_items,
                    "Shutdown requested, not starting remaining export jobs"
                );
                break;
            };

            let poller = self.poller.clone();
            let backend = self.backend.clone();
            let materializer = self.materializer.clone();
            join_set.spawn(run_item(item, poller, backend, materializer, permit));
        }

        // Join barrier
        let mut grace_deadline = None;
        let mut abandoned = false;
        let mut watching = true;
        loop {
            if !abandoned && grace_deadline.is_none() && *shutdown.borrow() && !join_set.is_empty()
            {
                tracing::info!(
                    in_flight = join_set.len(),
                    grace_secs = self.shutdown_grace.as_secs(),
                    "Waiting for in-flight export jobs"
                );
                grace_deadline = Some(Instant::now() + self.shutdown_grace);
            }

            let joined = match grace_deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, join_set.join_next()).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            tracing::warn!(
                                in_flight = join_set.len(),
                                "Shutdown grace period elapsed, abandoning in-flight export jobs"
                            );
                            join_set.abort_all();
                            abandoned = true;
                            grace_deadline = None;
                            continue;
                        }
                    }
                }
                None if watching && !*shutdown.borrow() => {
                    tokio::select! {
                        joined = join_set.join_next() => joined,
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                watching = false;
                            }
                            continue;
                        }
                    }
                }
                None => join_set.join_next().await,
            };

            match joined {
                Some(result) => record(&mut summary, result),
                None => break,
            }
        }

        let summary = summary.with_duration(start.elapsed());
        summary.log_summary();
        summary
    }
}

/// Waits for a worker slot unless a shutdown is requested first
async fn acquire(
    semaphore: &Arc<Semaphore>,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<OwnedSemaphorePermit> {
    loop {
        if *shutdown.borrow() {
            return None;
        }
        tokio::select! {
            permit = semaphore.clone().acquire_owned() => return permit.ok(),
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Sender dropped; no shutdown can arrive any more
                    return semaphore.clone().acquire_owned().await.ok();
                }
            }
        }
    }
}

async fn run_item(
    item: InventoryItem,
    poller: JobPoller,
    backend: Arc<dyn ExportBackend>,
    materializer: Materializer,
    _permit: OwnedSemaphorePermit,
) -> ItemOutcome {
    let objects = if item.kind.is_direct_fetch() {
        fetch_rule(backend.as_ref(), &item).await
    } else {
        poller.run(&item).await
    };

    let objects = match objects {
        Ok(objects) => objects,
        Err(failure) => {
            log_item_failure!(
                failure.kind,
                failure.item_id,
                failure.item_name,
                failure.job_label(),
                failure.reason
            );
            return ItemOutcome::Failed(failure);
        }
    };

    match materializer.materialize(item.kind, &objects).await {
        Ok(artifacts) => {
            tracing::info!(
                kind = %item.kind,
                item_id = %item.id,
                item_name = %item.name,
                artifacts = artifacts.len(),
                "Item exported"
            );
            ItemOutcome::Exported {
                artifacts: artifacts.len(),
                item,
            }
        }
        Err(e) => {
            log_item_failure!(item.kind, item.id, item.name, "-", e);
            ItemOutcome::WriteFailed {
                item,
                error: e.to_string(),
            }
        }
    }
}

/// Rules are not part of export payloads and are read directly by id
async fn fetch_rule(
    backend: &dyn ExportBackend,
    item: &InventoryItem,
) -> Result<Vec<Value>, JobFailure> {
    match backend.get_rule(&item.id).await {
        Ok(Lookup::Found(rule)) => Ok(vec![rule]),
        Ok(Lookup::NotFound(what)) => {
            tracing::warn!(kind = %item.kind, item_id = %item.id, "{what} not found, nothing to export");
            Ok(Vec::new())
        }
        Err(e) => Err(JobFailure::new(
            item,
            None,
            FailureReason::ResultUnavailable(e.to_string()),
        )),
    }
}

fn record(summary: &mut ExportSummary, joined: Result<ItemOutcome, JoinError>) {
    match joined {
        Ok(ItemOutcome::Exported { item, artifacts }) => {
            summary.record_exported(item.kind, artifacts);
        }
        Ok(ItemOutcome::Failed(failure)) => summary.record_failure(&failure),
        Ok(ItemOutcome::WriteFailed { item, error }) => {
            summary.failed_items += 1;
            summary.add_error(
                ExportError::new(ExportErrorType::Materialize, error)
                    .with_context(format!("kind={}, item_id={}", item.kind, item.id)),
            );
        }
        Err(e) => {
            let message = if e.is_cancelled() {
                "Export task abandoned during shutdown".to_string()
            } else {
                format!("Export task panicked: {e}")
            };
            tracing::error!(error = %e, "{message}");
            summary.failed_items += 1;
            summary.add_error(ExportError::new(ExportErrorType::Task, message));
        }
    }
}
