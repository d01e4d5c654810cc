//! Validate config command implementation
//!
//! This module implements the `validate-config` command. Credentials are
//! never printed.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let kinds: Vec<&str> = config.identity.kinds.iter().map(|k| k.as_str()).collect();

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Identity Platform: {}", config.identity.base_url);
        println!("  Kinds: {}", kinds.join(", "));
        println!("  Export Root: {}", config.export.export_root.display());
        println!("  Workers: {}", config.export.workers);
        println!(
            "  Poll: every {}s, deadline {}s",
            config.export.poll_interval_seconds, config.export.poll_timeout_seconds
        );
        println!(
            "  Repository: {}/{} ({})",
            config.publish.owner, config.publish.repository, config.publish.branch
        );
        if !config.publish.path_prefix.is_empty() {
            println!("  Path Prefix: {}", config.publish.path_prefix);
        }
        match &config.publish.ignore_file {
            Some(path) => println!("  Ignore File: {}", path.display()),
            None => println!("  Ignore File: (none)"),
        }
        println!("  Inline Ignore Rules: {}", config.publish.ignore_patterns.len());
        println!();

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_config_exit_code() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[identity]\nbase_url = \"ftp://nope\"\n").unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
