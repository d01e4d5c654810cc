//! Core business logic for idsnap.
//!
//! # Modules
//!
//! - [`context`] - Per-run context (run id, start time, configuration)
//! - [`export`] - Job poller, bounded scheduler and export summary
//! - [`materialize`] - Canonical artifact files under the export root
//! - [`publish`] - Ignore rules and the batch publisher
//! - [`pipeline`] - The run coordinator tying them together
//!
//! # Run Workflow
//!
//! 1. **Prepare**: clear the scratch export root
//! 2. **Enumerate**: list items for each configured kind
//! 3. **Export**: one export job per item under a worker ceiling
//! 4. **Materialize**: write each completed job's objects as JSON artifacts
//! 5. **Publish**: one commit with every non-ignored artifact, fast-forward only
//!
//! # Example
//!
//! ```rust,no_run
//! use idsnap::config::load_config;
//! use idsnap::core::pipeline::BackupCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("idsnap.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator = BackupCoordinator::from_config(config)?;
//! let report = coordinator.execute(shutdown_rx).await?;
//!
//! println!("Exported: {}", report.export.exported_items);
//! println!("Failed: {}", report.export.failed_items);
//! println!("Published: {}", report.published());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod export;
pub mod materialize;
pub mod pipeline;
pub mod publish;
