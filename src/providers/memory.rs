//! In-memory provider double with scripted failures.

use super::RecordProvider;
use crate::error::{ProviderError, ProviderErrorKind, ProviderResult};
use crate::record::{DomainRecord, RecordType};
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Mutex;

/// Which verb a scripted failure or a logged call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    List,
    Add,
    Remove,
}

/// A provider call as observed by the double.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Add(RecordType, String),
    Remove(RecordType, String),
}

/// Holds records in memory and behaves like a provider that rejects
/// duplicates and unknown values. Failures queued with [`fail_next`] are
/// returned, in order, before the verb touches the records.
///
/// [`fail_next`]: MemoryProvider::fail_next
#[derive(Default)]
pub struct MemoryProvider {
    records: Mutex<Vec<DomainRecord>>,
    failures: Mutex<Vec<(Verb, ProviderErrorKind)>>,
    calls: Mutex<Vec<Call>>,
}

impl MemoryProvider {
    pub fn with_records(records: Vec<DomainRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Queue a failure for the next call of `verb`.
    pub fn fail_next(&self, verb: Verb, kind: ProviderErrorKind) -> &Self {
        self.failures.lock().unwrap().push((verb, kind));
        self
    }

    pub fn records(&self) -> Vec<DomainRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that mutate records.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::List(_)))
            .collect()
    }

    fn scripted(&self, verb: Verb) -> ProviderResult<()> {
        let mut failures = self.failures.lock().unwrap();
        if let Some(pos) = failures.iter().position(|(v, _)| *v == verb) {
            let (_, kind) = failures.remove(pos);
            return Err(ProviderError::new(kind, format!("scripted {:?} failure", verb)));
        }
        Ok(())
    }
}

fn same_value(record: &DomainRecord, value: &str) -> bool {
    match value.parse::<IpAddr>() {
        Ok(ip) => record.holds(&ip),
        Err(_) => record.value == value,
    }
}

#[async_trait]
impl RecordProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_records(&self, domain: &str) -> ProviderResult<Vec<DomainRecord>> {
        self.calls.lock().unwrap().push(Call::List(domain.to_string()));
        self.scripted(Verb::List)?;

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_for(domain))
            .cloned()
            .collect())
    }

    async fn add_record(
        &self,
        domain: &str,
        record_type: RecordType,
        value: &str,
    ) -> ProviderResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Add(record_type, value.to_string()));
        self.scripted(Verb::Add)?;

        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| r.is_for(domain) && r.record_type == record_type && same_value(r, value))
        {
            return Err(ProviderError::new(
                ProviderErrorKind::Conflict,
                "record_already_exists_remove_first",
            ));
        }
        records.push(DomainRecord::new(domain, record_type, value));
        Ok(())
    }

    async fn remove_record(
        &self,
        domain: &str,
        record_type: RecordType,
        value: &str,
    ) -> ProviderResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Remove(record_type, value.to_string()));
        self.scripted(Verb::Remove)?;

        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| {
            !(r.is_for(domain) && r.record_type == record_type && same_value(r, value))
        });
        if records.len() == before {
            return Err(ProviderError::new(ProviderErrorKind::NotFound, "no_such_value"));
        }
        Ok(())
    }
}
