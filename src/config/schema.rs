//! Configuration schema types
//!
//! This module defines the configuration structure for idsnap. Everything the
//! pipeline needs (platform endpoint, repository identity, worker-pool size,
//! poll interval and timeout, ignore rules) is externally supplied here.

use crate::config::SecretString;
use crate::domain::EntityKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main idsnap configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdsnapConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Identity platform connection (inventory source and export backend)
    pub identity: IdentityConfig,

    /// Export job settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Version-control publish settings
    pub publish: PublishConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl IdsnapConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.identity.validate()?;
        self.export.validate()?;
        self.publish.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (export and materialize, but don't publish)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Retry configuration for inventory listing requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Identity platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the tenant API (e.g. `https://acme.api.identitynow.com`)
    pub base_url: String,

    /// Access token sent as a bearer credential
    /// Stored securely in memory and automatically zeroized on drop
    pub access_token: SecretString,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Page size for inventory listing
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Kinds to export (default: all)
    #[serde(default = "default_kinds")]
    pub kinds: Vec<EntityKind>,

    /// Retry configuration for inventory listing
    #[serde(default)]
    pub retry: RetryConfig,
}

impl IdentityConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("identity.base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("identity.base_url must start with http:// or https://".to_string());
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| format!("identity.base_url is not a valid URL: {e}"))?;

        if self.access_token.expose_secret().is_blank() {
            return Err("identity.access_token cannot be empty".to_string());
        }

        if self.page_size == 0 || self.page_size > 250 {
            return Err(format!(
                "identity.page_size must be between 1 and 250, got {}",
                self.page_size
            ));
        }

        if self.kinds.is_empty() {
            return Err("identity.kinds cannot be empty".to_string());
        }

        if self.retry.max_retries == 0 || self.retry.max_retries > 10 {
            return Err(format!(
                "identity.retry.max_retries must be between 1 and 10, got {}",
                self.retry.max_retries
            ));
        }

        Ok(())
    }
}

/// Export job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Scratch directory artifacts are materialized into; rebuilt every run
    #[serde(default = "default_export_root")]
    pub export_root: PathBuf,

    /// Worker ceiling for concurrently running export jobs
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Interval between job status polls in seconds
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// Deadline for a single export job in seconds
    #[serde(default = "default_poll_timeout_seconds")]
    pub poll_timeout_seconds: u64,

    /// Graceful shutdown timeout in seconds (default: 30)
    /// Maximum time to wait for in-flight jobs once a shutdown signal arrives.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.export_root.as_os_str().is_empty() {
            return Err("export.export_root cannot be empty".to_string());
        }

        if self.export_root.parent().is_none() {
            return Err(format!(
                "export.export_root must not be a filesystem root, got {}",
                self.export_root.display()
            ));
        }

        if self.workers == 0 || self.workers > 100 {
            return Err(format!(
                "export.workers must be between 1 and 100, got {}",
                self.workers
            ));
        }

        if self.poll_interval_seconds == 0 {
            return Err("export.poll_interval_seconds must be > 0".to_string());
        }

        if self.poll_timeout_seconds < self.poll_interval_seconds {
            return Err(format!(
                "export.poll_timeout_seconds ({}) must be >= export.poll_interval_seconds ({})",
                self.poll_timeout_seconds, self.poll_interval_seconds
            ));
        }

        Ok(())
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Poll deadline as a duration
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_seconds)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_root: default_export_root(),
            workers: default_workers(),
            poll_interval_seconds: default_poll_interval_seconds(),
            poll_timeout_seconds: default_poll_timeout_seconds(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Version-control publish configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Host API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Repository owner (user or organization)
    pub owner: String,

    /// Repository name
    pub repository: String,

    /// Branch whose pointer is advanced
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Host API token
    /// Stored securely in memory and automatically zeroized on drop
    pub token: SecretString,

    /// Optional gitignore-style rule file; a missing file excludes nothing
    #[serde(default)]
    pub ignore_file: Option<PathBuf>,

    /// Extra rules appended after the rule file
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Repository sub-directory the artifact tree is placed under (empty = root)
    #[serde(default)]
    pub path_prefix: String,

    /// Commit message; the UTC timestamp of the run is appended
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Concurrent blob uploads
    #[serde(default = "default_blob_concurrency")]
    pub blob_concurrency: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl PublishConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err("publish.api_url must start with http:// or https://".to_string());
        }

        if self.owner.trim().is_empty() {
            return Err("publish.owner cannot be empty".to_string());
        }

        if self.repository.trim().is_empty() {
            return Err("publish.repository cannot be empty".to_string());
        }

        if self.branch.trim().is_empty() {
            return Err("publish.branch cannot be empty".to_string());
        }

        if self.token.expose_secret().is_blank() {
            return Err("publish.token cannot be empty".to_string());
        }

        if self.path_prefix.starts_with('/') || self.path_prefix.contains("..") {
            return Err(format!(
                "publish.path_prefix must be a relative path without '..', got '{}'",
                self.path_prefix
            ));
        }

        if self.commit_message.trim().is_empty() {
            return Err("publish.commit_message cannot be empty".to_string());
        }

        if self.blob_concurrency == 0 || self.blob_concurrency > 32 {
            return Err(format!(
                "publish.blob_concurrency must be between 1 and 32, got {}",
                self.blob_concurrency
            ));
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_page_size() -> usize {
    250
}

fn default_kinds() -> Vec<EntityKind> {
    EntityKind::ALL.to_vec()
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_export_root() -> PathBuf {
    std::env::temp_dir().join("idsnap-exports")
}

fn default_workers() -> usize {
    10
}

fn default_poll_interval_seconds() -> u64 {
    15
}

fn default_poll_timeout_seconds() -> u64 {
    900
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_commit_message() -> String {
    "Automated export of identity configuration".to_string()
}

fn default_blob_concurrency() -> usize {
    4
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
