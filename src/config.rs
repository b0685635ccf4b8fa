//! Configuration and credential loading for the Salesforce MCP bridge
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`)
//! 3. Environment variables prefixed with `SF_` (`SF_USERNAME`, `SF_PASSWORD`,
//!    `SF_TOKEN`, `SF_DOMAIN`, `SF_API_VERSION`, `SF_LOGIN_URL`, ...)
//! 4. Command-line overrides

use crate::error::{Result, SalesforceMcpError};
use crate::normalize::DEFAULT_MAX_CANDIDATES;
use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_DOMAIN: &str = "login";
pub const DEFAULT_API_VERSION: &str = "59.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_LIST_RECORDS: u32 = 200;

static DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*$").expect("valid domain regex")
});

static API_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2,3}\.0$").expect("valid api version regex"));

/// Values as they come out of the layered sources, before validation
#[derive(Debug, Deserialize)]
struct RawConfig {
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    domain: String,
    api_version: String,
    login_url: Option<String>,
    request_timeout_secs: u64,
    max_candidates: usize,
    max_list_records: u32,
}

/// Command-line values that take precedence over file and environment
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub domain: Option<String>,
}

/// Validated configuration
#[derive(Debug)]
pub struct SalesforceConfig {
    pub username: String,
    pub password: SecretString,
    pub security_token: SecretString,
    /// `login` for production, `test` for sandboxes, or a My Domain prefix
    pub domain: String,
    pub api_version: String,
    /// Replaces `https://{domain}.salesforce.com` when set
    pub login_url: Option<String>,
    pub request_timeout: Duration,
    /// Cap on candidates listed in an ambiguous result
    pub max_candidates: usize,
    /// Row limit applied to list tools
    pub max_list_records: u32,
}

impl SalesforceConfig {
    /// Load from defaults, an optional file, the environment and overrides.
    pub fn load(file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("domain", DEFAULT_DOMAIN)?
            .set_default("api_version", DEFAULT_API_VERSION)?
            .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .set_default("max_candidates", DEFAULT_MAX_CANDIDATES as i64)?
            .set_default("max_list_records", DEFAULT_MAX_LIST_RECORDS as i64)?;

        if let Some(path) = file {
            debug!("Reading configuration file {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        let raw: RawConfig = builder
            .add_source(Environment::with_prefix("SF"))
            .set_override_option("username", overrides.username)?
            .set_override_option("password", overrides.password)?
            .set_override_option("token", overrides.token)?
            .set_override_option("domain", overrides.domain)?
            .build()?
            .try_deserialize()?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let username = required(raw.username, "username", "SF_USERNAME")?;
        let password = required(raw.password, "password", "SF_PASSWORD")?;
        let token = required(raw.token, "token", "SF_TOKEN")?;

        let domain = raw.domain.trim().to_string();
        if !DOMAIN.is_match(&domain) {
            return Err(invalid(format!(
                "domain must be a host prefix such as 'login' or 'test', got '{}'",
                domain
            )));
        }

        let api_version = raw.api_version.trim().trim_start_matches('v').to_string();
        if !API_VERSION.is_match(&api_version) {
            return Err(invalid(format!(
                "api_version must look like '59.0', got '{}'",
                raw.api_version
            )));
        }

        if raw.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs must be at least 1".to_string()));
        }
        if raw.max_list_records == 0 {
            return Err(invalid("max_list_records must be at least 1".to_string()));
        }

        Ok(Self {
            username,
            password: SecretString::from(password),
            security_token: SecretString::from(token),
            domain,
            api_version,
            login_url: raw.login_url.filter(|u| !u.trim().is_empty()),
            request_timeout: Duration::from_secs(raw.request_timeout_secs),
            max_candidates: raw.max_candidates.max(2),
            max_list_records: raw.max_list_records,
        })
    }
}

fn required(value: Option<String>, key: &str, env_var: &str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(invalid(format!(
            "Salesforce {} not set. Use {} or --sf-{}",
            key, env_var, key
        ))),
    }
}

fn invalid(message: String) -> SalesforceMcpError {
    SalesforceMcpError::Config(ConfigError::Message(message))
}
