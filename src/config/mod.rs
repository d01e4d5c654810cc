//! Configuration management for idsnap.
//!
//! # Overview
//!
//! idsnap uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `IDSNAP_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation before any work starts (missing credentials are fatal)
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry-run switch
//! - [`IdentityConfig`] - Identity platform endpoint, token, kinds to export
//! - [`ExportConfig`] - Scratch directory, worker ceiling, poll interval and deadline
//! - [`PublishConfig`] - Repository identity, branch, token, ignore rules
//! - [`LoggingConfig`] - Local JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! [identity]
//! base_url = "https://acme.api.identitynow.com"
//! access_token = "${IDSNAP_IDENTITY_TOKEN}"
//!
//! [export]
//! workers = 10
//! poll_interval_seconds = 15
//! poll_timeout_seconds = 900
//!
//! [publish]
//! owner = "acme"
//! repository = "iam-config"
//! branch = "main"
//! token = "${GITHUB_TOKEN}"
//! ignore_file = ".gitignore"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_kinds};
pub use schema::{
    ApplicationConfig, ExportConfig, IdentityConfig, IdsnapConfig, LoggingConfig, PublishConfig,
    RetryConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
