//! Monitoring-check reconciliation.

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use beacon_core::{BeaconConfig, Check, Failure};
use beacon_synthetic::{CheckSpec, SyntheticApi, SyntheticCheck};

use crate::{ReconcileOptions, ReconcileReport};

/// Checks that should exist: every endpoint with a URL, in job-label order.
pub fn desired_checks(config: &BeaconConfig) -> Vec<CheckSpec> {
    config
        .endpoints
        .iter()
        .filter(|(_, e)| !e.url.is_empty())
        .map(|(job, e)| CheckSpec {
            job: job.clone(),
            target: e.url.clone(),
            frequency: e.frequency,
            timeout: e.timeout,
            probes: e.probes.clone(),
            headers: e.headers.clone(),
        })
        .collect()
}

/// One-shot check creation from the status-source document.
///
/// Checks whose job already exists are left alone; nothing is updated or
/// deleted. `checks.json` carries no probe settings, so the endpoint
/// defaults apply.
pub fn provision_checks<A: SyntheticApi + ?Sized>(api: &A, checks: &[Check]) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let existing = match api.list_checks() {
        Ok(list) => list,
        Err(e) => {
            error!(error = %e, "failed to list checks");
            report.error(Failure::fatal("list checks", e));
            return report;
        }
    };

    for check in checks.iter().filter(|c| !c.url.is_empty()) {
        if existing.iter().any(|c| c.job == check.job_label) {
            info!(job = %check.job_label, "check already exists, skipping");
            continue;
        }
        let spec = CheckSpec {
            job: check.job_label.clone(),
            target: check.url.clone(),
            frequency: DEFAULT_FREQUENCY_MS,
            timeout: DEFAULT_TIMEOUT_MS,
            probes: DEFAULT_PROBES.to_vec(),
            headers: check.headers.clone(),
        };
        match api.add_check(&spec) {
            Ok(created) => {
                info!(job = %spec.job, id = created.id, "check created");
                report.created.push(spec.job);
            }
            Err(e) => {
                error!(job = %spec.job, error = %e, "failed to create check");
                report.error(Failure::isolated(format!("create check {}", spec.job), e));
            }
        }
    }

    report
}

const DEFAULT_FREQUENCY_MS: u64 = 60_000;
const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_PROBES: [i64; 3] = [1, 2, 3];

/// Converge the provider's checks with the configured endpoints.
pub fn reconcile_checks<A: SyntheticApi + ?Sized>(
    api: &A,
    config: &BeaconConfig,
    options: ReconcileOptions,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let existing = match api.list_checks() {
        Ok(list) => list,
        Err(e) => {
            error!(error = %e, "failed to list checks");
            report.error(Failure::fatal("list checks", e));
            return report;
        }
    };
    let by_job: BTreeMap<&str, &SyntheticCheck> =
        existing.iter().map(|c| (c.job.as_str(), c)).collect();

    for spec in desired_checks(config) {
        match by_job.get(spec.job.as_str()) {
            Some(current) if spec.differs_from(current) => {
                match api.update_check(current.id, &spec) {
                    Ok(_) => {
                        info!(job = %spec.job, "check updated");
                        report.updated.push(spec.job.clone());
                    }
                    Err(e) => {
                        error!(job = %spec.job, error = %e, "failed to update check");
                        report.error(Failure::isolated(format!("update check {}", spec.job), e));
                    }
                }
            }
            Some(_) => info!(job = %spec.job, "check up to date"),
            None => match api.add_check(&spec) {
                Ok(created) => {
                    info!(job = %spec.job, id = created.id, "check created");
                    report.created.push(spec.job.clone());
                }
                Err(e) => {
                    error!(job = %spec.job, error = %e, "failed to create check");
                    report.error(Failure::isolated(format!("create check {}", spec.job), e));
                }
            },
        }
    }

    for (job, check) in &by_job {
        if config.endpoints.contains_key(*job) {
            continue;
        }
        if !options.allow_deletions {
            warn!(%job, "check not in config, skipping deletion (set ALLOW_DELETIONS=true to remove)");
            continue;
        }
        match api.delete_check(check.id) {
            Ok(()) => {
                info!(%job, "orphaned check deleted");
                report.deleted.push(job.to_string());
            }
            Err(e) => {
                error!(%job, error = %e, "failed to delete check");
                report.error(Failure::isolated(format!("delete check {job}"), e));
            }
        }
    }

    report
}
