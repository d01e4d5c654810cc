//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "idsnap.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing idsnap configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your tenant and repository", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set IDSNAP_IDENTITY_TOKEN");
                println!("     - Set GITHUB_TOKEN");
                println!("  3. Validate configuration: idsnap validate-config");
                println!("  4. Try a dry run: idsnap run --dry-run");
                println!();
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to write configuration file");
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# idsnap Configuration File
# Identity configuration snapshots to a git repository

[application]
log_level = "info"
dry_run = false

[identity]
base_url = "https://acme.api.identitynow.com"
access_token = "${IDSNAP_IDENTITY_TOKEN}"

[export]
workers = 10
poll_interval_seconds = 15
poll_timeout_seconds = 900

[publish]
owner = "acme"
repository = "iam-config"
branch = "main"
token = "${GITHUB_TOKEN}"
ignore_file = ".gitignore"

[logging]
local_enabled = false
local_path = "/var/log/idsnap"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# idsnap Configuration File
#
# Exports identity-platform configuration objects, writes one JSON file per
# object and publishes the whole snapshot to a GitHub branch as one commit.
#
# Any value may reference an environment variable as ${NAME}. Every key can
# also be overridden with IDSNAP_<SECTION>_<KEY>.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Dry run mode (export and write artifacts, never publish)
dry_run = false

# ============================================================================
# Identity Platform
# ============================================================================
[identity]
# Tenant API base URL
base_url = "https://acme.api.identitynow.com"

# Bearer token (use an environment variable)
access_token = "${IDSNAP_IDENTITY_TOKEN}"

# Request timeout in seconds
timeout_seconds = 30

# Inventory page size (1-250)
page_size = 250

# Kinds to export (default: all)
kinds = [
    "ROLE",
    "SOURCE",
    "WORKFLOW",
    "TRANSFORM",
    "ACCESS_PROFILE",
    "SERVICE_DESK_INTEGRATION",
    "IDENTITY_PROFILE",
    "RULE",
]

# Retries for inventory listing and status polls
[identity.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

# ============================================================================
# Export Jobs
# ============================================================================
[export]
# Scratch directory; emptied at the start of every run
export_root = "/tmp/idsnap-exports"

# Maximum export jobs in flight (1-100)
workers = 10

# Seconds between status polls
poll_interval_seconds = 15

# Seconds before a job is given up as timed out
poll_timeout_seconds = 900

# Seconds to wait for in-flight jobs after Ctrl+C / SIGTERM
shutdown_timeout_secs = 30

# ============================================================================
# Publishing
# ============================================================================
[publish]
api_url = "https://api.github.com"
owner = "acme"
repository = "iam-config"

# Branch to advance; the update is never forced
branch = "main"

# Token with contents:write on the repository
token = "${GITHUB_TOKEN}"

# Gitignore-style rules applied to the export root (a missing file is fine)
ignore_file = ".gitignore"

# Extra rules applied after ignore_file
ignore_patterns = ["*.secret"]

# Sub-directory of the repository to place artifacts under (empty = root)
path_prefix = ""

# The run's UTC timestamp is appended
commit_message = "Automated export of identity configuration"

# Concurrent blob uploads (1-32)
blob_concurrency = 8

# ============================================================================
# Logging
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = true

# Local log directory
local_path = "/var/log/idsnap"

# Log rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdsnapConfig;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "idsnap.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "idsnap.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_are_valid() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config: IdsnapConfig = toml::from_str(&content).unwrap();
            config.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn test_existing_file_requires_force() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let output = file.path().to_str().unwrap().to_string();

        let args = InitArgs {
            output: output.clone(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);

        let args = InitArgs {
            output,
            with_examples: false,
            force: true,
        };
        assert_eq!(args.execute().await.unwrap(), 0);
        let written = std::fs::read_to_string(file.path()).unwrap();
        assert!(written.contains("[publish]"));
    }
}
