//! Reconciliation of provider records against the host's public addresses.
//!
//! A run is a single linear pass: resolve the public address of each
//! requested family, list the provider's records for the domain, compute
//! the plan, then apply it in order. Nothing is carried between runs.

use crate::config::Config;
use crate::detector::IpDetector;
use crate::error::{DdnsError, Phase, ProviderErrorKind, Result};
use crate::providers::{create_provider, RecordProvider};
use crate::record::{
    DomainRecord, Operation, PlannedOp, ReconciliationPlan, ResolvedAddress, TargetSpec,
};
use crate::retry::RetryPolicy;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::Instrument;

/// Outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub domain: String,
    pub resolved: Vec<ResolvedAddress>,
    /// Managed records as listed before any mutation.
    pub current: Vec<DomainRecord>,
    pub plan: ReconciliationPlan,
    /// Plan steps completed (including ones the provider reported as already done).
    pub applied: usize,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Whether the provider state differed from the resolved addresses.
    pub fn changed(&self) -> bool {
        !self.plan.is_empty()
    }
}

/// Compute the mutations that bring `current` in line with `resolved`.
///
/// Only records of `target.domain` and of the requested types are
/// considered. Per type, every record not holding the resolved address is
/// removed, then the address is added if no record already holds it.
pub fn plan(
    target: &TargetSpec,
    resolved: &[ResolvedAddress],
    current: &[DomainRecord],
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::new();

    for record_type in target.record_types() {
        let Some(address) = resolved.iter().find(|r| r.record_type == record_type) else {
            tracing::warn!(record_type = %record_type, "no resolved address, leaving records untouched");
            continue;
        };

        let existing: Vec<&DomainRecord> = current
            .iter()
            .filter(|r| r.is_for(&target.domain) && r.record_type == record_type)
            .collect();

        for stale in existing.iter().filter(|r| !r.holds(&address.value)) {
            // Removal is by value, so one call clears every copy of it.
            let queued = plan.iter().any(|op| {
                op.op == Operation::Remove
                    && op.record.record_type == record_type
                    && op.record.value == stale.value
            });
            if !queued {
                plan.push(PlannedOp::remove((*stale).clone()));
            }
        }

        if !existing.iter().any(|r| r.holds(&address.value)) {
            plan.push(PlannedOp::add(DomainRecord::new(
                target.domain.clone(),
                record_type,
                address.value.to_string(),
            )));
        }
    }

    plan
}

/// Applies plans for one target through a provider.
pub struct Reconciler {
    provider: Box<dyn RecordProvider>,
    target: TargetSpec,
    retry: RetryPolicy,
}

impl Reconciler {
    pub fn new(provider: Box<dyn RecordProvider>, target: TargetSpec, retry: RetryPolicy) -> Self {
        Self {
            provider,
            target,
            retry,
        }
    }

    pub fn target(&self) -> &TargetSpec {
        &self.target
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// List the provider's records for the target domain.
    pub async fn current_records(&self) -> Result<Vec<DomainRecord>> {
        let domain = self.target.domain.as_str();
        let records = self
            .retry
            .run("list records", || self.provider.list_records(domain))
            .await
            .map_err(|e| DdnsError::provider(Phase::Listing, e))?;

        tracing::debug!(count = records.len(), "listed provider records");
        Ok(records)
    }

    /// Apply `plan` in order, stopping at the first unrecoverable failure.
    ///
    /// An add reported as `Conflict` or a remove reported as `NotFound`
    /// means the step's end state already holds and counts as done.
    pub async fn execute(&self, plan: &[PlannedOp]) -> Result<usize> {
        let mut applied = 0;

        for step in plan {
            let record = &step.record;
            let (phase, outcome) = match step.op {
                Operation::Remove => (
                    Phase::Remove,
                    self.retry
                        .run("remove record", || {
                            self.provider.remove_record(
                                &record.domain,
                                record.record_type,
                                &record.value,
                            )
                        })
                        .await,
                ),
                Operation::Add => (
                    Phase::Add,
                    self.retry
                        .run("add record", || {
                            self.provider
                                .add_record(&record.domain, record.record_type, &record.value)
                        })
                        .await,
                ),
            };

            match outcome {
                Ok(()) => {
                    tracing::info!(
                        op = %step.op,
                        record_type = %record.record_type,
                        value = %record.value,
                        "record updated"
                    );
                }
                Err(e) if already_settled(step.op, e.kind) => {
                    tracing::info!(
                        op = %step.op,
                        record_type = %record.record_type,
                        value = %record.value,
                        reason = %e.kind,
                        "record already in desired state"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        op = %step.op,
                        record_type = %record.record_type,
                        value = %record.value,
                        error = %e,
                        applied,
                        remaining = plan.len() - applied,
                        "aborting plan"
                    );
                    return Err(DdnsError::provider(phase, e));
                }
            }
            applied += 1;
        }

        Ok(applied)
    }

    /// List, plan and (unless `dry_run`) apply for already-resolved addresses.
    pub async fn reconcile(&self, resolved: &[ResolvedAddress], dry_run: bool) -> Result<RunReport> {
        let started_at = Utc::now();

        let current: Vec<DomainRecord> = self
            .current_records()
            .await?
            .into_iter()
            .filter(|r| r.is_for(&self.target.domain) && self.target.wants(r.record_type))
            .collect();

        let plan = plan(&self.target, resolved, &current);

        if plan.is_empty() {
            tracing::info!("records up to date");
        } else {
            for step in &plan {
                tracing::info!(step = %step, dry_run, "planned");
            }
        }

        let applied = if dry_run || plan.is_empty() {
            0
        } else {
            self.execute(&plan).await?
        };

        Ok(RunReport {
            domain: self.target.domain.clone(),
            resolved: resolved.to_vec(),
            current,
            plan,
            applied,
            dry_run,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

fn already_settled(op: Operation, kind: ProviderErrorKind) -> bool {
    matches!(
        (op, kind),
        (Operation::Add, ProviderErrorKind::Conflict)
            | (Operation::Remove, ProviderErrorKind::NotFound)
    )
}

/// Abort `fut` once `budget` has elapsed.
pub async fn with_budget<T, F>(budget: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(budget, fut)
        .await
        .map_err(|_| DdnsError::Timeout(budget))?
}

/// Resolve the public addresses and reconcile them, within the run budget.
pub async fn run(config: &Config, dry_run: bool) -> Result<RunReport> {
    let detector = IpDetector::from_config(config)?;
    let reconciler = Reconciler::new(
        create_provider(config)?,
        config.target(),
        config.retry_policy(),
    );
    run_with(&detector, &reconciler, config.run_timeout(), dry_run).await
}

/// [`run`] with explicit collaborators.
pub async fn run_with(
    detector: &IpDetector,
    reconciler: &Reconciler,
    budget: Duration,
    dry_run: bool,
) -> Result<RunReport> {
    let target = reconciler.target();
    let span = tracing::info_span!("reconcile", domain = %target.domain);

    with_budget(budget, async {
        tracing::info!(ipv4 = target.want_ipv4, ipv6 = target.want_ipv6, "starting update");
        let resolved = detector.resolve(target.want_ipv4, target.want_ipv6).await?;
        for address in &resolved {
            tracing::info!(record_type = %address.record_type, ip = %address.value, "public address");
        }
        reconciler.reconcile(&resolved, dry_run).await
    })
    .instrument(span)
    .await
}
