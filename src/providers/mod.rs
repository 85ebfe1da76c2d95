//! DNS provider record clients.

mod dreamhost;
#[cfg(test)]
pub(crate) mod memory;
#[cfg(test)]
mod tests;

pub use dreamhost::DreamHostProvider;

use crate::config::Config;
use crate::error::{ProviderResult, Result};
use crate::record::{DomainRecord, RecordType};
use async_trait::async_trait;

/// The record verbs a provider exposes, scoped to one domain.
///
/// Implementations translate each call into a single API request. They
/// make no decisions and never retry; `Conflict` and `NotFound` are
/// reported as errors and interpreted by the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &'static str;

    /// List the A/AAAA records of `domain`. No ordering is guaranteed.
    async fn list_records(&self, domain: &str) -> ProviderResult<Vec<DomainRecord>>;

    /// Create a record.
    async fn add_record(&self, domain: &str, record_type: RecordType, value: &str)
        -> ProviderResult<()>;

    /// Delete the record holding `value`.
    async fn remove_record(
        &self,
        domain: &str,
        record_type: RecordType,
        value: &str,
    ) -> ProviderResult<()>;
}

/// Create the provider client described by configuration.
pub fn create_provider(config: &Config) -> Result<Box<dyn RecordProvider>> {
    let provider = DreamHostProvider::with_base_url(
        config.api_key.clone(),
        config.api_url.clone(),
        config.http_timeout(),
    )?;
    Ok(Box::new(provider))
}
