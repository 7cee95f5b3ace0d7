use std::process::ExitCode;

use anyhow::Context;
use tracing::{error, info};

use beacon_reconcile::provision_checks;
use beacon_state::SourceStore;

use super::{SyntheticArgs, exit_code};
use crate::Paths;

pub fn run(paths: &Paths, synthetic: &SyntheticArgs) -> anyhow::Result<ExitCode> {
    let source = SourceStore::new(&paths.checks)
        .load()?
        .with_context(|| format!("{} not found", paths.checks.display()))?;

    let client = synthetic.registered_client()?;
    let report = provision_checks(&client, &source.checks);

    for failure in &report.errors {
        error!(subject = %failure.subject, "{}", failure.message);
    }
    info!(
        created = report.created.len(),
        failed = report.errors.len(),
        "provisioning complete"
    );
    Ok(exit_code(report.has_errors()))
}
