//! # dreamhost-ddns
//!
//! Keeps the A (and optionally AAAA) record of a domain hosted on DreamHost
//! pointing at the public address of the machine it runs on.
//!
//! Each invocation is one stateless reconciliation: resolve the public
//! address, list the provider's records, compute the minimal remove/add
//! plan and apply it. Scheduling is left to cron or a systemd timer.
//!
//! ## Usage
//!
//! ```bash
//! # Reconcile once
//! dreamhost-ddns update
//!
//! # Show what would change
//! dreamhost-ddns status
//!
//! # Check configuration and credentials
//! dreamhost-ddns validate
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod providers;
pub mod reconciler;
pub mod record;
pub mod retry;

pub use config::Config;
pub use detector::IpDetector;
pub use error::{DdnsError, Phase, ProviderError, ProviderErrorKind, Result};
pub use reconciler::{plan, run, Reconciler, RunReport};
pub use record::{DomainRecord, PlannedOp, RecordType, ResolvedAddress, TargetSpec};
