//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for idsnap using clap.

pub mod commands;

use crate::config::{load_config, LoggingConfig};
use clap::{Parser, Subcommand};

/// idsnap - identity configuration snapshots to a git repository
#[derive(Parser, Debug)]
#[command(name = "idsnap")]
#[command(version, about, long_about = None)]
#[command(author = "idsnap Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "idsnap.toml", env = "IDSNAP_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "IDSNAP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level and logging settings to install before the command runs
    ///
    /// `run` takes both from its configuration file; `--log-level` wins over
    /// `application.log_level`. Other commands, and a `run` whose
    /// configuration does not load, log to the console only. The load error
    /// itself is reported by the command.
    pub fn logging_settings(&self) -> (String, LoggingConfig) {
        let loaded = match &self.command {
            Commands::Run(_) => load_config(&self.config).ok(),
            Commands::ValidateConfig(_) | Commands::Init(_) => None,
        };

        match loaded {
            Some(config) => (
                self.log_level
                    .clone()
                    .unwrap_or(config.application.log_level),
                config.logging,
            ),
            None => (
                self.log_level.clone().unwrap_or_else(|| "info".to_string()),
                LoggingConfig {
                    local_enabled: false,
                    ..LoggingConfig::default()
                },
            ),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every configured kind and publish the snapshot as one commit
    Run(commands::run::RunArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["idsnap", "run"]);
        assert_eq!(cli.config, "idsnap.toml");
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["idsnap", "--config", "custom.toml", "run"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["idsnap", "--log-level", "debug", "run"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_run_overrides() {
        let cli = Cli::parse_from([
            "idsnap",
            "run",
            "--dry-run",
            "--kinds",
            "ROLE,source",
            "--export-root",
            "/tmp/snap",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.dry_run);
        assert_eq!(args.kinds.as_deref(), Some("ROLE,source"));
        assert_eq!(args.export_root.as_deref(), Some(std::path::Path::new("/tmp/snap")));
    }

    fn write_config(log_dir: &std::path::Path) -> tempfile::NamedTempFile {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[application]
log_level = "debug"

[identity]
base_url = "https://acme.api.identitynow.com"
access_token = "tok"

[publish]
owner = "acme"
repository = "iam-config"
token = "ghp"

[logging]
local_enabled = true
local_path = "{}"
local_rotation = "hourly"
"#,
            log_dir.display()
        )
        .unwrap();
        file
    }

    #[test]
    fn test_run_logging_comes_from_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = write_config(dir.path());
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from(["idsnap", "--config", path, "run"]);
        let (level, logging) = cli.logging_settings();

        assert_eq!(level, "debug");
        assert!(logging.local_enabled);
        assert_eq!(logging.local_path, dir.path().display().to_string());
        assert_eq!(logging.local_rotation, "hourly");
    }

    #[test]
    fn test_log_level_flag_wins_over_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = write_config(dir.path());
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from(["idsnap", "--config", path, "--log-level", "warn", "run"]);
        let (level, logging) = cli.logging_settings();

        assert_eq!(level, "warn");
        assert!(logging.local_enabled);
    }

    #[test]
    fn test_console_only_logging_outside_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = write_config(dir.path());
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from(["idsnap", "--config", path, "validate-config"]);
        let (level, logging) = cli.logging_settings();
        assert_eq!(level, "info");
        assert!(!logging.local_enabled);

        let cli = Cli::parse_from(["idsnap", "--config", "/nonexistent/idsnap.toml", "run"]);
        let (level, logging) = cli.logging_settings();
        assert_eq!(level, "info");
        assert!(!logging.local_enabled);
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["idsnap", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["idsnap", "init", "--force"]);
        let Commands::Init(args) = cli.command else {
            panic!("expected init command");
        };
        assert!(args.force);
        assert_eq!(args.output, "idsnap.toml");
    }
}
