//! DNS record and plan types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Managed record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    A,
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Record type that holds the given address.
    pub fn for_ip(ip: &IpAddr) -> Self {
        if ip.is_ipv4() {
            RecordType::A
        } else {
            RecordType::Aaaa
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(format!("unmanaged record type: {}", other)),
        }
    }
}

/// One DNS record as seen from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub domain: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub value: String,
    /// Provider-specific identifier, when the provider has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl DomainRecord {
    pub fn new(domain: impl Into<String>, record_type: RecordType, value: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            record_type,
            value: value.into(),
            record_id: None,
        }
    }

    /// Whether this record belongs to `domain`.
    pub fn is_for(&self, domain: &str) -> bool {
        same_domain(&self.domain, domain)
    }

    /// Whether the record value is the given address.
    ///
    /// Values are compared as parsed addresses so that equivalent IPv6
    /// spellings match; unparsable values never match.
    pub fn holds(&self, ip: &IpAddr) -> bool {
        self.value
            .trim()
            .parse::<IpAddr>()
            .map(|v| v == *ip)
            .unwrap_or(false)
    }
}

impl fmt::Display for DomainRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.domain, self.record_type, self.value)
    }
}

/// Compare DNS names case-insensitively, ignoring a trailing root dot.
pub fn same_domain(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// What the caller wants managed for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub domain: String,
    pub want_ipv4: bool,
    pub want_ipv6: bool,
}

impl TargetSpec {
    /// Requested record types, A before AAAA.
    pub fn record_types(&self) -> Vec<RecordType> {
        let mut types = Vec::with_capacity(2);
        if self.want_ipv4 {
            types.push(RecordType::A);
        }
        if self.want_ipv6 {
            types.push(RecordType::Aaaa);
        }
        types
    }

    pub fn wants(&self, record_type: RecordType) -> bool {
        match record_type {
            RecordType::A => self.want_ipv4,
            RecordType::Aaaa => self.want_ipv6,
        }
    }
}

/// A public address determined for one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAddress {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub value: IpAddr,
}

impl From<IpAddr> for ResolvedAddress {
    fn from(ip: IpAddr) -> Self {
        Self {
            record_type: RecordType::for_ip(&ip),
            value: ip,
        }
    }
}

/// Mutation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Add,
    Remove,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add => f.write_str("ADD"),
            Operation::Remove => f.write_str("REMOVE"),
        }
    }
}

/// One planned mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedOp {
    pub op: Operation,
    pub record: DomainRecord,
}

impl PlannedOp {
    pub fn add(record: DomainRecord) -> Self {
        Self {
            op: Operation::Add,
            record,
        }
    }

    pub fn remove(record: DomainRecord) -> Self {
        Self {
            op: Operation::Remove,
            record,
        }
    }
}

impl fmt::Display for PlannedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.record)
    }
}

/// Ordered mutations for one run.
pub type ReconciliationPlan = Vec<PlannedOp>;
