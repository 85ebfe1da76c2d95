//! Error types for dreamhost-ddns.

use crate::record::RecordType;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for dreamhost-ddns.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// Result type returned by provider clients.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Credential missing, invalid or expired.
    Unauthorized,
    /// The provider asked us to slow down.
    RateLimited,
    /// Transport failure, timeout or provider-side internal error.
    Network,
    /// Response did not have the expected shape.
    Malformed,
    /// The provider understood the request and refused it.
    Rejected,
    /// The exact record already exists.
    Conflict,
    /// The record to remove does not exist.
    NotFound,
}

impl ProviderErrorKind {
    /// Whether another attempt may succeed without operator action.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Network)
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate limited",
            Self::Network => "network error",
            Self::Malformed => "malformed response",
            Self::Rejected => "rejected",
            Self::Conflict => "conflict",
            Self::NotFound => "not found",
        };
        f.write_str(s)
    }
}

/// A failure reported by a provider client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unauthorized, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Malformed, message)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::network(e.to_string())
    }
}

/// Stage of a run in which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolution,
    Listing,
    Add,
    Remove,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Resolution => "resolution",
            Phase::Listing => "listing",
            Phase::Add => "add",
            Phase::Remove => "remove",
        };
        f.write_str(s)
    }
}

/// DDNS error types.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Public IP could not be determined.
    #[error("IP resolution failed ({family}): {message}")]
    Resolution { family: RecordType, message: String },

    /// Provider call failed after any retries.
    #[error("Provider {phase} failed: {source}")]
    Provider {
        phase: Phase,
        #[source]
        source: ProviderError,
    },

    /// The run exceeded its time budget.
    #[error("Run exceeded time budget of {}s", .0.as_secs())]
    Timeout(Duration),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DdnsError {
    pub fn provider(phase: Phase, source: ProviderError) -> Self {
        DdnsError::Provider { phase, source }
    }

    /// Phase of the run this error belongs to, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            DdnsError::Resolution { .. } => Some(Phase::Resolution),
            DdnsError::Provider { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Provider error kind, if this is a provider failure.
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            DdnsError::Provider { source, .. } => Some(source.kind),
            _ => None,
        }
    }

    /// Process exit code for this error. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            DdnsError::Config(_) => 78,
            DdnsError::Provider { source, .. } if source.kind == ProviderErrorKind::Unauthorized => 2,
            _ => 1,
        }
    }
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for DdnsError {
    fn from(e: toml::ser::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for DdnsError {
    fn from(e: serde_json::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}
