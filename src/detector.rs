//! Public IP detection.

use crate::config::Config;
use crate::error::{DdnsError, Result};
use crate::record::{RecordType, ResolvedAddress};
use std::net::IpAddr;
use std::time::Duration;

/// Resolves the host's public addresses through family-specific echo services.
///
/// Dual-stack hosts reach a generic echo service over either family, so each
/// family has its own endpoint that is only reachable over that family.
pub struct IpDetector {
    client: reqwest::Client,
    ipv4_service: String,
    ipv6_service: String,
}

impl IpDetector {
    /// Create a detector from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_services(
            config.ipv4_service.clone(),
            config.ipv6_service.clone(),
            config.http_timeout(),
        )
    }

    /// Create a detector with custom services.
    pub fn with_services(
        ipv4_service: String,
        ipv6_service: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DdnsError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            ipv4_service,
            ipv6_service,
        })
    }

    /// Resolve one address per requested family, A first.
    ///
    /// A family that is not requested is never queried.
    pub async fn resolve(&self, want_ipv4: bool, want_ipv6: bool) -> Result<Vec<ResolvedAddress>> {
        let mut resolved = Vec::with_capacity(2);
        if want_ipv4 {
            resolved.push(self.detect(RecordType::A).await?);
        }
        if want_ipv6 {
            resolved.push(self.detect(RecordType::Aaaa).await?);
        }
        Ok(resolved)
    }

    /// Detect the public address for one family.
    pub async fn detect(&self, family: RecordType) -> Result<ResolvedAddress> {
        let url = match family {
            RecordType::A => &self.ipv4_service,
            RecordType::Aaaa => &self.ipv6_service,
        };

        let ip = self.try_service(url, family).await?;
        if RecordType::for_ip(&ip) != family {
            return Err(DdnsError::Resolution {
                family,
                message: format!("{} returned {} which is not an {} address", url, ip, family),
            });
        }

        tracing::debug!(record_type = %family, %ip, service = %url, "detected public address");
        Ok(ResolvedAddress {
            record_type: family,
            value: ip,
        })
    }

    /// Try a single IP detection service.
    async fn try_service(&self, url: &str, family: RecordType) -> Result<IpAddr> {
        let fail = |message: String| DdnsError::Resolution { family, message };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(fail(format!("HTTP {} from {}", response.status(), url)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| fail(format!("reading body from {} failed: {}", url, e)))?;
        let ip_str = text.trim();

        ip_str
            .parse()
            .map_err(|_| fail(format!("Invalid IP response: {:?}", ip_str)))
    }
}
