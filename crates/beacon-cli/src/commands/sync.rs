use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use beacon_state::{MappingStore, ReportStore};
use beacon_statuspage::{IncidentEngine, IncidentPolicy, sync_components};

use super::{StatuspageArgs, exit_code};
use crate::Paths;

pub fn run(paths: &Paths, statuspage: &StatuspageArgs) -> anyhow::Result<ExitCode> {
    let mapping = MappingStore::new(&paths.mapping)
        .load()?
        .with_context(|| format!("{} not found", paths.mapping.display()))?;
    let report = ReportStore::new(&paths.status)
        .load()?
        .with_context(|| format!("{} not found, run `beacon monitor` first", paths.status.display()))?;

    if mapping.component_mapping.is_empty() {
        warn!("no component mappings configured");
        return Ok(ExitCode::SUCCESS);
    }

    let client = statuspage.client(&mapping.page_id)?;
    let now = Utc::now();

    let synced = sync_components(&client, &mapping.component_mapping, &report, now);
    info!(
        updated = synced.updated.len(),
        skipped = synced.skipped.len(),
        metrics = synced.metrics_submitted,
        failures = synced.errors.len(),
        "component sync complete"
    );

    let policy = IncidentPolicy::from(&mapping.incidents);
    let incidents = IncidentEngine::new(&client, policy).run(&mapping.component_mapping, &report, now);
    if policy.auto_create {
        info!(summary = %incidents.summary(), "incident processing complete");
    }

    Ok(exit_code(synced.has_errors() || incidents.has_errors()))
}
