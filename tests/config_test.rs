//! Integration tests for layered configuration loading
//!
//! These tests mutate process environment variables, so they run serially.

use salesforce_mcp::{ConfigOverrides, SalesforceConfig};
use secrecy::ExposeSecret;
use serial_test::serial;
use std::io::Write;
use std::time::Duration;

const VARS: &[&str] = &[
    "SF_USERNAME",
    "SF_PASSWORD",
    "SF_TOKEN",
    "SF_DOMAIN",
    "SF_API_VERSION",
    "SF_LOGIN_URL",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

fn set_credentials() {
    std::env::set_var("SF_USERNAME", "ops@acme.com");
    std::env::set_var("SF_PASSWORD", "hunter2");
    std::env::set_var("SF_TOKEN", "00TOKEN");
}

#[test]
#[serial]
fn test_env_credentials_with_defaults() {
    clear_env();
    set_credentials();

    let config = SalesforceConfig::load(None, ConfigOverrides::default()).unwrap();
    assert_eq!(config.username, "ops@acme.com");
    assert_eq!(config.password.expose_secret(), "hunter2");
    assert_eq!(config.domain, "login");
    assert_eq!(config.api_version, "59.0");
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.max_candidates, 10);
    assert_eq!(config.max_list_records, 200);
    assert!(config.login_url.is_none());

    clear_env();
}

#[test]
#[serial]
fn test_missing_token_is_reported() {
    clear_env();
    std::env::set_var("SF_USERNAME", "ops@acme.com");
    std::env::set_var("SF_PASSWORD", "hunter2");

    let err = SalesforceConfig::load(None, ConfigOverrides::default()).unwrap_err();
    assert!(err.to_string().contains("SF_TOKEN"));

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_beat_environment() {
    clear_env();
    set_credentials();
    std::env::set_var("SF_DOMAIN", "login");

    let overrides = ConfigOverrides {
        username: Some("admin@acme.com.uat".to_string()),
        domain: Some("test".to_string()),
        ..Default::default()
    };
    let config = SalesforceConfig::load(None, overrides).unwrap();
    assert_eq!(config.username, "admin@acme.com.uat");
    assert_eq!(config.domain, "test");
    assert_eq!(config.security_token.expose_secret(), "00TOKEN");

    clear_env();
}

#[test]
#[serial]
fn test_file_then_environment() {
    clear_env();

    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
username = "file-user@acme.com"
password = "from-file"
token = "FILETOKEN"
api_version = "60.0"
request_timeout_secs = 12
max_candidates = 5
max_list_records = 50
"#
    )
    .unwrap();

    std::env::set_var("SF_PASSWORD", "from-env");

    let config = SalesforceConfig::load(Some(file.path()), ConfigOverrides::default()).unwrap();
    assert_eq!(config.username, "file-user@acme.com");
    assert_eq!(config.password.expose_secret(), "from-env");
    assert_eq!(config.api_version, "60.0");
    assert_eq!(config.request_timeout, Duration::from_secs(12));
    assert_eq!(config.max_candidates, 5);
    assert_eq!(config.max_list_records, 50);

    clear_env();
}

#[test]
#[serial]
fn test_missing_config_file_is_an_error() {
    clear_env();
    set_credentials();

    let missing = std::path::Path::new("/nonexistent/salesforce-mcp.toml");
    assert!(SalesforceConfig::load(Some(missing), ConfigOverrides::default()).is_err());

    clear_env();
}
