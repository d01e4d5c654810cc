//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::IdsnapConfig;
use crate::config::secret_string;
use crate::domain::errors::IdsnapError;
use crate::domain::result::Result;
use crate::domain::EntityKind;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into IdsnapConfig
/// 4. Applies environment variable overrides (IDSNAP_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file is missing or unreadable, a
/// referenced variable is unset, parsing fails, or validation fails. Missing
/// credentials therefore abort before any work starts.
///
/// # Examples
///
/// ```no_run
/// use idsnap::config::loader::load_config;
///
/// let config = load_config("idsnap.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<IdsnapConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(IdsnapError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        IdsnapError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: IdsnapConfig = toml::from_str(&contents)
        .map_err(|e| IdsnapError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        IdsnapError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| IdsnapError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        // Comment lines keep their placeholders untouched
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(IdsnapError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using IDSNAP_* prefix
///
/// Environment variables follow the pattern: IDSNAP_<SECTION>_<KEY>
/// For example: IDSNAP_PUBLISH_BRANCH, IDSNAP_EXPORT_WORKERS
fn apply_env_overrides(config: &mut IdsnapConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("IDSNAP_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("IDSNAP_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Identity overrides
    if let Ok(val) = std::env::var("IDSNAP_IDENTITY_BASE_URL") {
        config.identity.base_url = val;
    }
    if let Ok(val) = std::env::var("IDSNAP_IDENTITY_ACCESS_TOKEN") {
        config.identity.access_token = secret_string(val);
    }
    if let Ok(val) = std::env::var("IDSNAP_IDENTITY_KINDS") {
        config.identity.kinds = parse_kinds(&val).map_err(IdsnapError::Configuration)?;
    }

    // Export overrides
    if let Ok(val) = std::env::var("IDSNAP_EXPORT_EXPORT_ROOT") {
        config.export.export_root = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("IDSNAP_EXPORT_WORKERS") {
        if let Ok(workers) = val.parse() {
            config.export.workers = workers;
        }
    }
    if let Ok(val) = std::env::var("IDSNAP_EXPORT_POLL_INTERVAL_SECONDS") {
        if let Ok(interval) = val.parse() {
            config.export.poll_interval_seconds = interval;
        }
    }
    if let Ok(val) = std::env::var("IDSNAP_EXPORT_POLL_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.export.poll_timeout_seconds = timeout;
        }
    }

    // Publish overrides
    if let Ok(val) = std::env::var("IDSNAP_PUBLISH_API_URL") {
        config.publish.api_url = val;
    }
    if let Ok(val) = std::env::var("IDSNAP_PUBLISH_OWNER") {
        config.publish.owner = val;
    }
    if let Ok(val) = std::env::var("IDSNAP_PUBLISH_REPOSITORY") {
        config.publish.repository = val;
    }
    if let Ok(val) = std::env::var("IDSNAP_PUBLISH_BRANCH") {
        config.publish.branch = val;
    }
    if let Ok(val) = std::env::var("IDSNAP_PUBLISH_TOKEN") {
        config.publish.token = secret_string(val);
    }
    if let Ok(val) = std::env::var("IDSNAP_PUBLISH_IGNORE_FILE") {
        config.publish.ignore_file = Some(PathBuf::from(val));
    }

    // Logging overrides
    if let Ok(val) = std::env::var("IDSNAP_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("IDSNAP_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

/// Parses a comma-separated kind list such as `ROLE,access-profile`
pub fn parse_kinds(value: &str) -> std::result::Result<Vec<EntityKind>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(EntityKind::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("IDSNAP_TEST_SUBST_VAR", "test_value");
        let input = "token = \"${IDSNAP_TEST_SUBST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "token = \"test_value\"\n");
        std::env::remove_var("IDSNAP_TEST_SUBST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("IDSNAP_TEST_MISSING_VAR");
        let input = "token = \"${IDSNAP_TEST_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("IDSNAP_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("IDSNAP_TEST_COMMENTED_VAR");
        let input = "# token = \"${IDSNAP_TEST_COMMENTED_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${IDSNAP_TEST_COMMENTED_VAR}"));
    }

    #[test]
    fn test_parse_kinds() {
        let kinds = parse_kinds("ROLE, access-profile,,rule").unwrap();
        assert_eq!(
            kinds,
            vec![EntityKind::Role, EntityKind::AccessProfile, EntityKind::Rule]
        );
        assert!(parse_kinds("ROLE,GROUP").is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-idsnap.toml");
        assert!(matches!(result, Err(IdsnapError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "info"

[identity]
base_url = "https://acme.api.identitynow.com"
access_token = "identity-token"
kinds = ["ROLE", "RULE"]

[export]
workers = 4

[publish]
owner = "acme"
repository = "iam-config"
token = "ghp_token"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.identity.base_url, "https://acme.api.identitynow.com");
        assert_eq!(config.identity.kinds, vec![EntityKind::Role, EntityKind::Rule]);
        assert_eq!(config.export.workers, 4);
        assert_eq!(config.export.poll_interval_seconds, 15);
        assert_eq!(config.publish.branch, "main");
        assert_eq!(config.publish.api_url, "https://api.github.com");
        assert_eq!(config.publish.token.expose_secret(), "ghp_token");
    }
}
