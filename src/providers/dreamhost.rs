//! DreamHost DNS API client.

use super::RecordProvider;
use crate::error::{DdnsError, ProviderError, ProviderErrorKind, ProviderResult, Result};
use crate::record::{same_domain, DomainRecord, RecordType};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.dreamhost.com";

const CMD_LIST: &str = "dns-list_records";
const CMD_ADD: &str = "dns-add_record";
const CMD_REMOVE: &str = "dns-remove_record";

/// DreamHost DNS provider.
///
/// Every request carries the API key and a fresh `unique_id`, which
/// DreamHost requires to be different on each call.
pub struct DreamHostProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DreamHostProvider {
    /// Create a new DreamHost provider.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), timeout)
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dreamhost-ddns/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DdnsError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Issue one API command and return the payload that follows `success`.
    async fn call(&self, cmd: &str, params: &[(&str, &str)]) -> ProviderResult<String> {
        let unique_id = uuid::Uuid::new_v4().to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("key", self.api_key.as_str()),
            ("cmd", cmd),
            ("unique_id", unique_id.as_str()),
        ];
        query.extend_from_slice(params);

        tracing::debug!(cmd, %unique_id, "DreamHost API request");

        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if let Some(err) = status_error(status) {
            return Err(err);
        }

        let body = response.text().await?;
        tracing::debug!(cmd, body = %body.trim(), "DreamHost API response");
        parse_response(&body)
    }
}

#[async_trait]
impl RecordProvider for DreamHostProvider {
    fn name(&self) -> &'static str {
        "dreamhost"
    }

    async fn list_records(&self, domain: &str) -> ProviderResult<Vec<DomainRecord>> {
        let payload = self.call(CMD_LIST, &[]).await?;
        Ok(parse_records(&payload, domain))
    }

    async fn add_record(
        &self,
        domain: &str,
        record_type: RecordType,
        value: &str,
    ) -> ProviderResult<()> {
        self.call(
            CMD_ADD,
            &[
                ("record", domain),
                ("type", record_type.as_str()),
                ("value", value),
            ],
        )
        .await?;
        Ok(())
    }

    async fn remove_record(
        &self,
        domain: &str,
        record_type: RecordType,
        value: &str,
    ) -> ProviderResult<()> {
        self.call(
            CMD_REMOVE,
            &[
                ("record", domain),
                ("type", record_type.as_str()),
                ("value", value),
            ],
        )
        .await?;
        Ok(())
    }
}

/// Map an HTTP status to a provider error, if it is not a success.
fn status_error(status: StatusCode) -> Option<ProviderError> {
    if status.is_success() {
        return None;
    }

    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderErrorKind::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => ProviderErrorKind::RateLimited,
        s if s.is_server_error() => ProviderErrorKind::Network,
        _ => ProviderErrorKind::Malformed,
    };
    Some(ProviderError::new(kind, format!("HTTP {}", status)))
}

/// Split a response into its payload, or the error it reports.
///
/// Bodies look like `success\n<rows>` or `error\n<code>`.
pub(crate) fn parse_response(body: &str) -> ProviderResult<String> {
    let mut lines = body.lines().skip_while(|l| l.trim().is_empty());

    match lines.next().map(str::trim) {
        Some("success") => Ok(lines.collect::<Vec<_>>().join("\n")),
        Some("error") => {
            let code = lines
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("unknown_error");
            Err(ProviderError::new(classify_error(code), code))
        }
        Some(other) => Err(ProviderError::malformed(format!(
            "unexpected response status line: {:?}",
            other
        ))),
        None => Err(ProviderError::malformed("empty response body")),
    }
}

/// Classify a DreamHost error code.
pub(crate) fn classify_error(code: &str) -> ProviderErrorKind {
    if code.starts_with("record_already_exists") {
        ProviderErrorKind::Conflict
    } else if code.starts_with("no_such_") {
        ProviderErrorKind::NotFound
    } else if code.contains("key") {
        ProviderErrorKind::Unauthorized
    } else if code == "slow_down_bucko" || code.contains("rate") {
        ProviderErrorKind::RateLimited
    } else if code.starts_with("internal_error") {
        ProviderErrorKind::Network
    } else {
        ProviderErrorKind::Rejected
    }
}

/// Extract the managed records of `domain` from a listing payload.
///
/// Rows are tab separated: `account_id zone record type value comment editable`.
pub(crate) fn parse_records(payload: &str, domain: &str) -> Vec<DomainRecord> {
    payload
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').map(str::trim).collect();
            if cols.len() < 5 || cols[0] == "account_id" {
                return None;
            }

            let (record, record_type, value) = (cols[2], cols[3], cols[4]);
            if !same_domain(record, domain) {
                return None;
            }

            let record_type = record_type.parse::<RecordType>().ok()?;
            Some(DomainRecord::new(record, record_type, value))
        })
        .collect()
}
