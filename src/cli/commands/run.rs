//! Run command implementation
//!
//! This module implements the `run` command: export every configured kind
//! from the identity platform and publish the snapshot as a single commit.

use crate::config::{load_config, parse_kinds, IdsnapConfig};
use crate::core::pipeline::{BackupCoordinator, PublishStatus, RunReport, SkipReason};
use crate::core::publish::{PublishError, PublishOutcome};
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Dry run mode - export and materialize, but do not publish
    #[arg(long)]
    pub dry_run: bool,

    /// Override kinds to export (comma-separated, e.g. ROLE,SOURCE)
    #[arg(long)]
    pub kinds: Option<String>,

    /// Override the scratch directory artifacts are written to
    #[arg(long, value_name = "PATH")]
    pub export_root: Option<PathBuf>,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        if let Err(e) = self.apply_overrides(&mut config) {
            tracing::error!(error = %e, "Invalid command line override");
            eprintln!("{e}");
            return Ok(2);
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        if config.application.dry_run {
            println!("🔍 DRY RUN MODE - artifacts are written locally, nothing is published");
            println!();
        }

        let coordinator = match BackupCoordinator::from_config(config) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create backup coordinator");
                eprintln!("Failed to initialize run: {e}");
                return Ok(4);
            }
        };

        println!("🚀 Starting export...");
        println!();

        let report = match coordinator.execute(shutdown_signal).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Run failed");
                eprintln!("Run failed: {e}");
                return Ok(5);
            }
        };

        print_report(&report);

        Ok(report.exit_code())
    }

    /// Apply command line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut IdsnapConfig) -> Result<(), String> {
        if let Some(kinds) = &self.kinds {
            let kinds = parse_kinds(kinds)?;
            if kinds.is_empty() {
                return Err("--kinds must name at least one kind".to_string());
            }
            tracing::info!(kinds = ?kinds, "Overriding kinds from CLI");
            config.identity.kinds = kinds;
        }

        if let Some(root) = &self.export_root {
            tracing::info!(export_root = %root.display(), "Overriding export root from CLI");
            config.export.export_root = root.clone();
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        Ok(())
    }
}

fn print_report(report: &RunReport) {
    let summary = &report.export;

    println!();
    println!("📊 Export Summary:");
    println!("  Run ID: {}", report.run_id);
    println!("  Total Items: {}", summary.total_items);
    println!("  Exported: {}", summary.exported_items);
    println!("  Failed: {}", summary.failed_items);
    println!("  Skipped: {}", summary.skipped_items);
    println!("  Empty Results: {}", summary.empty_results);
    println!("  Artifacts Written: {}", summary.artifacts_written);
    for (kind, count) in &summary.artifacts_by_kind {
        println!("    {kind}: {count}");
    }
    if report.failed_kinds > 0 {
        println!("  Kinds Not Listed: {}", report.failed_kinds);
    }
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("  Success Rate: {:.2}%", summary.success_rate());
    println!();

    if !summary.errors.is_empty() {
        println!("⚠️  Errors encountered:");
        for error in &summary.errors {
            println!("  - {:?}: {}", error.error_type, error.message);
            if let Some(context) = &error.context {
                println!("    Context: {context}");
            }
        }
        println!();
    }

    match &report.publish {
        PublishStatus::Completed(PublishOutcome::Published {
            commit_sha, files, ..
        }) => {
            println!("✅ Published {files} files as commit {commit_sha}");
        }
        PublishStatus::Completed(PublishOutcome::NoOp) => {
            println!("✅ Nothing to publish");
        }
        PublishStatus::Skipped(SkipReason::DryRun) => {
            println!("🔍 Dry run complete, publish skipped");
        }
        PublishStatus::Skipped(SkipReason::Interrupted) => {
            println!("⚠️  Run interrupted. The partial snapshot was not published.");
        }
        PublishStatus::Failed(e @ PublishError::Rejected { .. }) => {
            println!("❌ {e}");
            println!("   The branch moved during the run; nothing was overwritten.");
        }
        PublishStatus::Failed(e) => {
            println!("❌ Publish failed: {e}");
        }
    }
}
