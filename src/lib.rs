// idsnap - Identity configuration snapshots to git
// Copyright (c) 2025 idsnap Contributors
// Licensed under the MIT License

//! # idsnap - identity configuration snapshots
//!
//! idsnap exports the configuration objects of an identity-governance tenant
//! (roles, sources, workflows, transforms, access profiles, service-desk
//! integrations, identity profiles and connector rules), writes each object
//! as a canonical JSON file and publishes the whole snapshot to a GitHub
//! branch as a single commit.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Job poller, export scheduler, materializer, ignore filter, batch publisher
//! - [`adapters`] - External integrations (identity platform, GitHub git-data API)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use idsnap::config::load_config;
//! use idsnap::core::pipeline::BackupCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("idsnap.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//!     let report = BackupCoordinator::from_config(config)?
//!         .execute(shutdown_rx)
//!         .await?;
//!
//!     println!("Exported {} items", report.export.exported_items);
//!     std::process::exit(report.exit_code());
//! }
//! ```
//!
//! ## Publishing
//!
//! A snapshot is published through the host's low-level object API: one
//! blob per file, one tree on top of the branch's current tree, one commit
//! whose parent is the tip read at the start of the publish, then a
//! non-forcing ref update. If the branch moved in the meantime the update is
//! rejected and nothing on the branch changes.
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`], built on
//! [`domain::IdsnapError`]. Per-item failures do not abort a run; they are
//! collected into the run report and reflected in the exit code.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
