use std::process::ExitCode;

use tracing::{error, info, warn};

use beacon_core::BeaconConfig;
use beacon_reconcile::{
    ReconcileOptions, ReconcileReport, mapping_document, reconcile_checks, reconcile_statuspage,
    status_source,
};
use beacon_state::{MappingStore, SourceStore};

use super::{StatuspageArgs, SyntheticArgs, exit_code};
use crate::Paths;

pub fn run(
    paths: &Paths,
    statuspage: &StatuspageArgs,
    synthetic: &SyntheticArgs,
    allow_deletions: bool,
) -> anyhow::Result<ExitCode> {
    let config = BeaconConfig::from_file(&paths.config)?;
    if config.endpoints.is_empty() {
        warn!("no endpoints defined in {}", paths.config.display());
        return Ok(ExitCode::SUCCESS);
    }
    let options = ReconcileOptions { allow_deletions };
    info!(endpoints = config.endpoints.len(), allow_deletions, "reconciling");

    SourceStore::new(&paths.checks).save(&status_source(&config))?;
    info!(path = %paths.checks.display(), "status source regenerated");

    let checks = if synthetic.is_configured() {
        match synthetic.registered_client() {
            Ok(client) => Some(reconcile_checks(&client, &config, options)),
            Err(e) => {
                error!(error = %e, "cannot reach synthetic monitoring");
                return Ok(ExitCode::FAILURE);
            }
        }
    } else {
        info!("GRAFANA_SM_TOKEN not set, skipping check reconciliation");
        None
    };

    let store = MappingStore::new(&paths.mapping);
    let existing = store
        .load_lenient()
        .map(|doc| doc.component_mapping)
        .unwrap_or_default();

    let components = if statuspage.is_configured() && !config.statuspage.page_id.is_empty() {
        let client = statuspage.client(&config.statuspage.page_id)?;
        let (report, mapping) = reconcile_statuspage(&client, &config, &existing, options);
        store.save(&mapping_document(&config, mapping))?;
        Some(report)
    } else {
        info!("status page credentials not set, regenerating mapping without remote calls");
        store.save(&mapping_document(&config, existing))?;
        None
    };
    info!(path = %paths.mapping.display(), "mapping document written");

    let mut failed = false;
    for (system, report) in [("checks", &checks), ("components", &components)] {
        if let Some(report) = report {
            print_report(system, report);
            failed |= report.has_errors();
        }
    }
    Ok(exit_code(failed))
}

fn print_report(system: &str, report: &ReconcileReport) {
    info!(%system, summary = %report.summary(), "reconcile complete");
}
