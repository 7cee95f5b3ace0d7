use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use beacon_state::{ReportStore, SourceStore};
use beacon_status::StatusMonitor;

use super::PrometheusArgs;
use crate::Paths;

pub fn run(paths: &Paths, prometheus: &PrometheusArgs) -> anyhow::Result<ExitCode> {
    let source = SourceStore::new(&paths.checks)
        .load()?
        .with_context(|| format!("{} not found, run `beacon reconcile` first", paths.checks.display()))?;

    if source.checks.is_empty() {
        warn!("no checks configured");
        return Ok(ExitCode::SUCCESS);
    }
    info!(checks = source.checks.len(), "monitoring");

    let monitor = StatusMonitor::new(prometheus.client()?, ReportStore::new(&paths.status));
    let outcome = monitor.run(&source, Utc::now())?;

    info!(
        overall = %outcome.report.overall_status,
        changed = outcome.changed,
        failures = outcome.failures.len(),
        path = %paths.status.display(),
        "status report written"
    );
    Ok(ExitCode::SUCCESS)
}
