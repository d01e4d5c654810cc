//! Backup coordinator - one full export-and-publish run
//!
//! 1. **Prepare**: rebuild the scratch export root
//! 2. **Enumerate**: list items per configured kind; a failing kind is
//!    recorded and the others continue
//! 3. **Export**: fan out jobs and wait for every one to settle
//! 4. **Publish**: one batch commit of the export root, unless the run is a
//!    dry run or was interrupted

use crate::adapters::identity::{ExportBackend, IdentityClient, InventorySource};
use crate::adapters::vcs::{GitHubClient, VcsHost};
use crate::config::IdsnapConfig;
use crate::core::context::RunContext;
use crate::core::export::{ExportError, ExportErrorType, ExportScheduler, ExportSummary};
use crate::core::materialize::Materializer;
use crate::core::publish::{BatchPublisher, IgnoreFilter, PublishError, PublishOutcome, PublishState};
use crate::domain::context::ResultExt;
use crate::domain::{IdsnapError, InventoryItem, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

/// Why a publish was not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DryRun,
    Interrupted,
}

/// What happened to the publish step
#[derive(Debug)]
pub enum PublishStatus {
    Skipped(SkipReason),
    Completed(PublishOutcome),
    Failed(PublishError),
}

/// Outcome of one run
#[derive(Debug)]
pub struct RunReport {
    pub run_id: uuid::Uuid,

    /// Kinds whose inventory could not be listed
    pub failed_kinds: usize,

    pub export: ExportSummary,

    pub publish: PublishStatus,
}

impl RunReport {
    /// Process exit code for this run
    ///
    /// Publish failures outrank item failures; an interrupted run is 130.
    pub fn exit_code(&self) -> i32 {
        match &self.publish {
            PublishStatus::Failed(PublishError::Rejected { .. }) => 3,
            PublishStatus::Failed(PublishError::Aborted { .. }) => 5,
            PublishStatus::Skipped(SkipReason::Interrupted) => 130,
            _ if self.failed_kinds > 0 || !self.export.is_successful() => 1,
            _ => 0,
        }
    }

    /// Whether a new commit landed
    pub fn published(&self) -> bool {
        matches!(
            self.publish,
            PublishStatus::Completed(PublishOutcome::Published { .. })
        )
    }
}

/// Runs the whole pipeline against injected collaborators
pub struct BackupCoordinator {
    ctx: RunContext,
    inventory: Arc<dyn InventorySource>,
    backend: Arc<dyn ExportBackend>,
    host: Arc<dyn VcsHost>,
}

impl BackupCoordinator {
    pub fn new(
        ctx: RunContext,
        inventory: Arc<dyn InventorySource>,
        backend: Arc<dyn ExportBackend>,
        host: Arc<dyn VcsHost>,
    ) -> Self {
        Self {
            ctx,
            inventory,
            backend,
            host,
        }
    }

    /// Wire the HTTP clients from configuration
    pub fn from_config(config: IdsnapConfig) -> Result<Self> {
        let identity = Arc::new(IdentityClient::new(config.identity.clone())?);
        let github = Arc::new(GitHubClient::new(config.publish.clone())?);
        Ok(Self::new(
            RunContext::new(config),
            identity.clone(),
            identity,
            github,
        ))
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Execute one run
    ///
    /// Only failures to prepare the export root are returned as `Err`;
    /// item and publish failures are reported through [`RunReport`].
    pub async fn execute(&self, shutdown: watch::Receiver<bool>) -> Result<RunReport> {
        let span = self.ctx.span();
        self.run(shutdown).instrument(span).await
    }

    async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<RunReport> {
        let config = &self.ctx.config;
        let export_root = config.export.export_root.as_path();

        tracing::info!(
            started_at = %self.ctx.started_at,
            export_root = %export_root.display(),
            kinds = config.identity.kinds.len(),
            dry_run = self.ctx.dry_run(),
            "Starting run"
        );

        prepare_export_root(export_root).await?;

        let (items, listing_errors) = self.enumerate(&shutdown).await;
        let failed_kinds = listing_errors.len();

        let scheduler = ExportScheduler::new(
            self.backend.clone(),
            Materializer::new(export_root),
            &config.export,
        );
        let mut export = scheduler.run_all(items, shutdown.clone()).await;
        for error in listing_errors {
            export.add_error(error);
        }

        let publish = if *shutdown.borrow() {
            tracing::warn!("Run interrupted, partial snapshot not published");
            PublishStatus::Skipped(SkipReason::Interrupted)
        } else if self.ctx.dry_run() {
            tracing::info!(export_root = %export_root.display(), "Dry run, publish skipped");
            PublishStatus::Skipped(SkipReason::DryRun)
        } else {
            match self.publish(export_root).await {
                Ok(outcome) => PublishStatus::Completed(outcome),
                Err(e) => PublishStatus::Failed(e),
            }
        };

        let report = RunReport {
            run_id: self.ctx.run_id,
            failed_kinds,
            export,
            publish,
        };
        tracing::info!(
            exit_code = report.exit_code(),
            published = report.published(),
            failed_kinds = report.failed_kinds,
            "Run finished"
        );
        Ok(report)
    }

    /// List every configured kind; failures are isolated per kind
    async fn enumerate(
        &self,
        shutdown: &watch::Receiver<bool>,
    ) -> (Vec<InventoryItem>, Vec<ExportError>) {
        let mut items = Vec::new();
        let mut errors = Vec::new();

        for kind in &self.ctx.config.identity.kinds {
            if *shutdown.borrow() {
                tracing::warn!(kind = %kind, "Shutdown requested, not listing remaining kinds");
                break;
            }

            match self.inventory.list(*kind).await {
                Ok(listed) => {
                    tracing::info!(kind = %kind, count = listed.len(), "Listed inventory");
                    items.extend(listed);
                }
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "Inventory listing failed, skipping kind");
                    errors.push(
                        ExportError::new(ExportErrorType::Listing, e.to_string())
                            .with_context(format!("kind={kind}")),
                    );
                }
            }
        }

        (items, errors)
    }

    async fn publish(&self, export_root: &Path) -> std::result::Result<PublishOutcome, PublishError> {
        let publish_config = &self.ctx.config.publish;

        let filter = IgnoreFilter::load(
            publish_config.ignore_file.as_deref(),
            &publish_config.ignore_patterns,
        )
        .map_err(|e| PublishError::Aborted {
            stage: PublishState::Collect,
            source: e,
        })?;

        BatchPublisher::new(self.host.clone(), publish_config)
            .publish(export_root, &filter, &self.ctx.commit_message())
            .await
    }
}

/// Marker file written into every export root idsnap creates
pub const EXPORT_ROOT_MARKER: &str = ".idsnap-export-root";

/// Empty the scratch directory so only this run's artifacts are published
///
/// A non-empty directory without the marker was not created by idsnap and
/// is left untouched.
async fn prepare_export_root(root: &Path) -> Result<()> {
    match tokio::fs::read_dir(root).await {
        Ok(mut entries) => {
            let owned = root.join(EXPORT_ROOT_MARKER).is_file();
            let empty = entries
                .next_entry()
                .await
                .with_context(|| format!("Failed to read export root {}", root.display()))?
                .is_none();
            if !owned && !empty {
                return Err(IdsnapError::Configuration(format!(
                    "Export root {} is not empty and was not created by idsnap, refusing to clear it",
                    root.display()
                )));
            }
            tokio::fs::remove_dir_all(root)
                .await
                .with_context(|| format!("Failed to clear export root {}", root.display()))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read export root {}", root.display()))
        }
    }

    tokio::fs::create_dir_all(root)
        .await
        .with_context(|| format!("Failed to create export root {}", root.display()))?;
    tokio::fs::write(root.join(EXPORT_ROOT_MARKER), b"")
        .await
        .with_context(|| format!("Failed to mark export root {}", root.display()))
}
