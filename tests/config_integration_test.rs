//! Integration tests for configuration loading and validation
//!
//! Tests touching IDSNAP_* variables hold ENV_MUTEX so they do not observe
//! each other's overrides.

use idsnap::config::load_config;
use idsnap::domain::EntityKind;
use secrecy::ExposeSecret;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    std::env::remove_var("IDSNAP_APPLICATION_DRY_RUN");
    std::env::remove_var("IDSNAP_EXPORT_WORKERS");
    std::env::remove_var("IDSNAP_PUBLISH_BRANCH");
    std::env::remove_var("IDSNAP_IDENTITY_KINDS");
    std::env::remove_var("TEST_IDSNAP_IDENTITY_TOKEN");
    std::env::remove_var("TEST_IDSNAP_GITHUB_TOKEN");
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

const MINIMAL: &str = r#"
[identity]
base_url = "https://acme.api.identitynow.com"
access_token = "identity-token"

[publish]
owner = "acme"
repository = "iam-config"
token = "ghp_token"
"#;

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[application]
log_level = "debug"
dry_run = true

[identity]
base_url = "https://acme.api.identitynow.com"
access_token = "identity-token"
timeout_seconds = 10
page_size = 100
kinds = ["ROLE", "ACCESS_PROFILE", "RULE"]

[identity.retry]
max_retries = 5
initial_delay_ms = 200

[export]
export_root = "/tmp/idsnap-test-exports"
workers = 4
poll_interval_seconds = 5
poll_timeout_seconds = 300
shutdown_timeout_secs = 10

[publish]
api_url = "https://github.example.com/api/v3"
owner = "acme"
repository = "iam-config"
branch = "snapshots"
token = "ghp_token"
ignore_file = ".idsnapignore"
ignore_patterns = ["*.secret", "WORKFLOW/"]
path_prefix = "tenants/acme"
commit_message = "Nightly snapshot"
blob_concurrency = 8

[logging]
local_enabled = false
local_path = "/tmp/idsnap-logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);

    assert_eq!(config.identity.base_url, "https://acme.api.identitynow.com");
    assert_eq!(config.identity.access_token.expose_secret().as_ref(), "identity-token");
    assert_eq!(config.identity.page_size, 100);
    assert_eq!(
        config.identity.kinds,
        vec![EntityKind::Role, EntityKind::AccessProfile, EntityKind::Rule]
    );
    assert_eq!(config.identity.retry.max_retries, 5);
    assert_eq!(config.identity.retry.initial_delay_ms, 200);

    assert_eq!(config.export.export_root, PathBuf::from("/tmp/idsnap-test-exports"));
    assert_eq!(config.export.workers, 4);
    assert_eq!(config.export.poll_interval_seconds, 5);
    assert_eq!(config.export.poll_timeout_seconds, 300);

    assert_eq!(config.publish.api_url, "https://github.example.com/api/v3");
    assert_eq!(config.publish.branch, "snapshots");
    assert_eq!(config.publish.ignore_file, Some(PathBuf::from(".idsnapignore")));
    assert_eq!(config.publish.ignore_patterns.len(), 2);
    assert_eq!(config.publish.path_prefix, "tenants/acme");
    assert_eq!(config.publish.commit_message, "Nightly snapshot");
    assert_eq!(config.publish.blob_concurrency, 8);

    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_uses_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config(MINIMAL);
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert!(!config.application.dry_run);
    assert_eq!(config.identity.kinds, EntityKind::ALL.to_vec());
    assert_eq!(config.export.workers, 10);
    assert_eq!(config.export.poll_interval_seconds, 15);
    assert_eq!(config.export.poll_timeout_seconds, 900);
    assert_eq!(config.publish.api_url, "https://api.github.com");
    assert_eq!(config.publish.branch, "main");
    assert!(config.publish.ignore_file.is_none());
    assert!(config.publish.path_prefix.is_empty());
}

#[test]
fn test_env_var_substitution() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_IDSNAP_IDENTITY_TOKEN", "from-env-identity");
    std::env::set_var("TEST_IDSNAP_GITHUB_TOKEN", "from-env-github");

    let temp_file = write_config(
        r#"
[identity]
base_url = "https://acme.api.identitynow.com"
access_token = "${TEST_IDSNAP_IDENTITY_TOKEN}"

[publish]
owner = "acme"
repository = "iam-config"
token = "${TEST_IDSNAP_GITHUB_TOKEN}"
"#,
    );
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.identity.access_token.expose_secret().as_ref(), "from-env-identity");
    assert_eq!(config.publish.token.expose_secret().as_ref(), "from-env-github");

    cleanup_env_vars();
}

#[test]
fn test_missing_credential_variable_is_fatal() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[identity]
base_url = "https://acme.api.identitynow.com"
access_token = "${TEST_IDSNAP_IDENTITY_TOKEN}"

[publish]
owner = "acme"
repository = "iam-config"
token = "ghp_token"
"#,
    );
    let err = load_config(temp_file.path()).unwrap_err();

    assert!(err.to_string().contains("TEST_IDSNAP_IDENTITY_TOKEN"));
}

#[test]
fn test_env_overrides() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("IDSNAP_APPLICATION_DRY_RUN", "true");
    std::env::set_var("IDSNAP_EXPORT_WORKERS", "2");
    std::env::set_var("IDSNAP_PUBLISH_BRANCH", "backup");
    std::env::set_var("IDSNAP_IDENTITY_KINDS", "role,source");

    let temp_file = write_config(MINIMAL);
    let result = load_config(temp_file.path());
    cleanup_env_vars();
    let config = result.unwrap();

    assert!(config.application.dry_run);
    assert_eq!(config.export.workers, 2);
    assert_eq!(config.publish.branch, "backup");
    assert_eq!(config.identity.kinds, vec![EntityKind::Role, EntityKind::Source]);
}

#[test]
fn test_invalid_values_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let cases = [
        ("workers = 0", "export.workers"),
        ("poll_interval_seconds = 30\npoll_timeout_seconds = 10", "poll_timeout_seconds"),
    ];
    for (export_section, expected) in cases {
        let temp_file = write_config(&format!("{MINIMAL}\n[export]\n{export_section}\n"));
        let err = load_config(temp_file.path()).unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "expected '{expected}' in '{err}'"
        );
    }
}

#[test]
fn test_missing_publish_section_is_fatal() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[identity]
base_url = "https://acme.api.identitynow.com"
access_token = "identity-token"
"#,
    );

    assert!(load_config(temp_file.path()).is_err());
}

#[test]
fn test_missing_file() {
    let err = load_config("/nonexistent/idsnap.toml").unwrap_err();
    assert!(err.to_string().contains("not found"));
}
