//! Configuration management for dreamhost-ddns.

use crate::error::{DdnsError, Result};
use crate::record::TargetSpec;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `api_key`.
pub const ENV_API_KEY: &str = "DREAMHOST_API_KEY";
/// Environment variable overriding `domain`.
pub const ENV_DOMAIN: &str = "DREAMHOST_UPDATE_DOMAIN";
/// Environment variable enabling AAAA management.
pub const ENV_CHECK_IPV6: &str = "CHECK_IPV6";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// DreamHost API key (or environment variable name if prefixed with $).
    #[serde(default)]
    pub api_key: String,

    /// Fully qualified record name to keep updated (e.g. "home.example.com").
    #[serde(default)]
    pub domain: String,

    /// Manage the A record.
    #[serde(default = "default_true")]
    pub ipv4: bool,

    /// Manage the AAAA record.
    #[serde(default)]
    pub ipv6: bool,

    /// DreamHost API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// IPv4-only echo service.
    #[serde(default = "default_ipv4_service")]
    pub ipv4_service: String,

    /// IPv6-only echo service.
    #[serde(default = "default_ipv6_service")]
    pub ipv6_service: String,

    /// Timeout for each outbound HTTP call, in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Time budget for a whole run, in seconds.
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,

    /// Retry settings for provider calls.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_true() -> bool {
    true
}

fn default_api_url() -> String {
    "https://api.dreamhost.com".to_string()
}

fn default_ipv4_service() -> String {
    "https://checkip.amazonaws.com".to_string()
}

fn default_ipv6_service() -> String {
    "https://api6.ipify.org".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

fn default_run_timeout() -> u64 {
    120
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per provider call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failed attempt, in milliseconds.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound on any single delay, in milliseconds.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    1000
}

fn default_max_backoff() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            domain: String::new(),
            ipv4: true,
            ipv6: false,
            api_url: default_api_url(),
            ipv4_service: default_ipv4_service(),
            ipv6_service: default_ipv6_service(),
            http_timeout_secs: default_http_timeout(),
            run_timeout_secs: default_run_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DdnsError::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("dreamhost-ddns").join("config.toml"))
    }

    /// Load configuration from a specific path, then apply environment overrides.
    ///
    /// A missing file yields the defaults, so a purely environment-driven
    /// setup works without any file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.resolve_secrets();
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from a variable lookup (the process environment in practice).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.api_key = key;
        }
        if let Some(domain) = lookup(ENV_DOMAIN).filter(|v| !v.is_empty()) {
            self.domain = domain;
        }
        if let Some(flag) = lookup(ENV_CHECK_IPV6) {
            self.ipv6 = parse_flag(&flag);
        }
    }

    /// Resolve `$VAR` references in secret fields.
    pub fn resolve_secrets(&mut self) {
        self.api_key = resolve_env(&self.api_key);
    }

    /// Check that the configuration can drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(DdnsError::Config(format!(
                "api_key is empty (set it in the config file or {})",
                ENV_API_KEY
            )));
        }
        if self.api_key.starts_with('$') {
            return Err(DdnsError::Config(format!(
                "api_key references unset environment variable {}",
                &self.api_key[1..]
            )));
        }
        if self.domain.trim().is_empty() {
            return Err(DdnsError::Config(format!(
                "domain is empty (set it in the config file or {})",
                ENV_DOMAIN
            )));
        }
        if !self.ipv4 && !self.ipv6 {
            return Err(DdnsError::Config(
                "at least one of ipv4 or ipv6 must be enabled".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(DdnsError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.http_timeout_secs == 0 || self.run_timeout_secs == 0 {
            return Err(DdnsError::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The records this configuration manages.
    pub fn target(&self) -> TargetSpec {
        TargetSpec {
            domain: self.domain.trim().to_string(),
            want_ipv4: self.ipv4,
            want_ipv6: self.ipv6,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
        }
    }

    /// Generate example configuration.
    pub fn example() -> Self {
        Self {
            api_key: format!("${}", ENV_API_KEY),
            domain: "home.example.com".to_string(),
            ipv4: true,
            ipv6: false,
            ..Self::default()
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// Resolve environment variable references (values starting with $).
pub(crate) fn resolve_env(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        std::env::var(var_name).unwrap_or_else(|_| {
            tracing::warn!("Environment variable {} not set", var_name);
            value.to_string()
        })
    } else {
        value.to_string()
    }
}
