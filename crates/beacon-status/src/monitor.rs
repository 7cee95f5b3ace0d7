//! The monitor pass: fetch, classify, compare, persist.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use beacon_core::{Failure, StatusReport, StatusSource};
use beacon_metrics::{MetricSample, MetricSource};
use beacon_state::{ReportStore, StateResult};

use crate::report::{build_status_report, has_status_changed};

/// Result of one monitor pass.
#[derive(Debug)]
pub struct MonitorOutcome {
    pub report: StatusReport,
    /// Whether any status differs from the previously stored report.
    pub changed: bool,
    /// Checks whose metrics could not be fetched (reported as outages).
    pub failures: Vec<Failure>,
}

/// Runs a monitor pass against a metric source and a report store.
pub struct StatusMonitor<S> {
    source: S,
    store: ReportStore,
}

impl<S: MetricSource> StatusMonitor<S> {
    pub fn new(source: S, store: ReportStore) -> Self {
        Self { source, store }
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Evaluate every check in `input` and overwrite the stored report.
    ///
    /// A fetch failure for one check does not stop the others; that check
    /// is classified with no data. Only a failure to save is returned as
    /// an error.
    pub fn run(&self, input: &StatusSource, now: DateTime<Utc>) -> StateResult<MonitorOutcome> {
        let windows = input.settings.windows();
        let mut samples = HashMap::with_capacity(input.checks.len());
        let mut failures = Vec::new();

        for check in &input.checks {
            let sample = match self.source.fetch(&check.job_label, &windows) {
                Ok(sample) => sample,
                Err(e) => {
                    warn!(job_label = %check.job_label, error = %e, "metric fetch failed");
                    failures.push(Failure::isolated(&check.job_label, e.to_string()));
                    MetricSample::absent()
                }
            };
            samples.insert(check.job_label.clone(), sample);
        }

        let report = build_status_report(&input.checks, &samples, input.settings.thresholds(), now);
        for c in &report.components {
            debug!(
                component = %c.name,
                status = %c.status,
                reachability = ?c.reachability,
                latency_ms = ?c.latency_ms,
                "component evaluated"
            );
        }

        let previous = self.store.load_lenient();
        let changed = has_status_changed(previous.as_ref(), &report);
        if changed {
            info!(overall = %report.overall_status, "status changed");
        } else {
            info!(overall = %report.overall_status, "no status change, metrics refreshed");
        }

        self.store.save(&report)?;

        Ok(MonitorOutcome {
            report,
            changed,
            failures,
        })
    }
}
