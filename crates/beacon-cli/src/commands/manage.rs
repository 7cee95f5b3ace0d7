use std::process::ExitCode;

use anyhow::Context;
use clap::Subcommand;
use tracing::info;

use beacon_core::MappingDocument;
use beacon_reconcile::{
    adopt_components, adopt_metrics, cleanup, delete_component, delete_metric,
};
use beacon_state::{MappingStore, SourceStore};
use beacon_statuspage::{StatusPageApi, StatuspageClient};
use beacon_synthetic::SyntheticApi;

use super::{StatuspageArgs, SyntheticArgs, exit_code};
use crate::Paths;

#[derive(Subcommand, Debug, Clone)]
pub enum ManageAction {
    /// List components on the status page.
    ListComponents,
    /// List metrics on the status page.
    ListMetrics,
    /// List incidents on the status page.
    ListIncidents,
    /// List monitoring checks.
    ListChecks,
    /// List probe locations.
    ListProbes,
    /// Adopt or create a component for every check in checks.json.
    SyncComponents,
    /// Adopt or create a latency metric for every mapped component.
    SyncMetrics,
    /// Delete a component (and its metric) by job label.
    DeleteComponent { job_label: String },
    /// Delete a component's metric by job label.
    DeleteMetric { job_label: String },
    /// Delete every managed metric and component.
    Cleanup {
        /// Actually delete; without this only the plan is printed.
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(
    paths: &Paths,
    statuspage: &StatuspageArgs,
    synthetic: &SyntheticArgs,
    action: ManageAction,
) -> anyhow::Result<ExitCode> {
    match action {
        ManageAction::ListChecks => return list_checks(synthetic),
        ManageAction::ListProbes => return list_probes(synthetic),
        _ => {}
    }

    let store = MappingStore::new(&paths.mapping);
    let mut doc = store
        .load()?
        .with_context(|| format!("{} not found", paths.mapping.display()))?;
    let client = statuspage.client(&doc.page_id)?;

    let report = match action {
        ManageAction::ListComponents => return list_components(&client),
        ManageAction::ListMetrics => return list_metrics(&client),
        ManageAction::ListIncidents => return list_incidents(&client),
        ManageAction::ListChecks | ManageAction::ListProbes => return Ok(ExitCode::SUCCESS),
        ManageAction::SyncComponents => {
            let source = SourceStore::new(&paths.checks)
                .load()?
                .with_context(|| format!("{} not found", paths.checks.display()))?;
            adopt_components(&client, &source.checks, &mut doc.component_mapping)
        }
        ManageAction::SyncMetrics => adopt_metrics(&client, &mut doc.component_mapping),
        ManageAction::DeleteComponent { job_label } => {
            delete_component(&client, &mut doc.component_mapping, &job_label)
        }
        ManageAction::DeleteMetric { job_label } => {
            delete_metric(&client, &mut doc.component_mapping, &job_label)
        }
        ManageAction::Cleanup { yes } => {
            if !yes {
                print_cleanup_plan(&doc);
                return Ok(ExitCode::SUCCESS);
            }
            cleanup(&client, &mut doc.component_mapping)
        }
    };

    store.save(&doc)?;
    info!(path = %paths.mapping.display(), summary = %report.summary(), "mapping saved");
    Ok(exit_code(report.has_errors()))
}

fn print_cleanup_plan(doc: &MappingDocument) {
    if doc.component_mapping.is_empty() {
        println!("No components to clean up.");
        return;
    }
    let names: Vec<&str> = doc
        .component_mapping
        .iter()
        .map(|(job, e)| if e.name.is_empty() { job.as_str() } else { e.name.as_str() })
        .collect();
    println!(
        "This will delete {} component(s): {}",
        names.len(),
        names.join(", ")
    );
    println!("Re-run with --yes to proceed.");
}

fn list_components(client: &StatuspageClient) -> anyhow::Result<ExitCode> {
    let components = client.list_components()?;
    if components.is_empty() {
        println!("No components found.");
        return Ok(ExitCode::SUCCESS);
    }
    println!("\n{:<30} {:<15} {:<20}", "Name", "ID", "Status");
    println!("{}", "-".repeat(65));
    for c in &components {
        println!("{:<30} {:<15} {:<20}", c.name, c.id, c.status.as_str());
    }
    println!("\nTotal: {} components", components.len());
    Ok(ExitCode::SUCCESS)
}

fn list_metrics(client: &StatuspageClient) -> anyhow::Result<ExitCode> {
    let metrics = client.list_metrics()?;
    if metrics.is_empty() {
        println!("No metrics found.");
        return Ok(ExitCode::SUCCESS);
    }
    println!("\n{:<35} {:<15} {:<10}", "Name", "ID", "Suffix");
    println!("{}", "-".repeat(65));
    for m in &metrics {
        println!("{:<35} {:<15} {:<10}", m.name, m.id, m.suffix);
    }
    println!("\nTotal: {} metrics", metrics.len());
    Ok(ExitCode::SUCCESS)
}

fn list_incidents(client: &StatuspageClient) -> anyhow::Result<ExitCode> {
    let incidents = client.list_incidents()?;
    if incidents.is_empty() {
        println!("No incidents found.");
        return Ok(ExitCode::SUCCESS);
    }
    println!("\n{:<45} {:<15} {:<15} Impact", "Name", "ID", "Status");
    println!("{}", "-".repeat(90));
    for i in &incidents {
        let name: String = i.name.chars().take(44).collect();
        println!("{:<45} {:<15} {:<15} {}", name, i.id, i.status.as_str(), i.impact);
    }
    println!("\nTotal: {} incidents", incidents.len());
    Ok(ExitCode::SUCCESS)
}

fn list_checks(synthetic: &SyntheticArgs) -> anyhow::Result<ExitCode> {
    let client = synthetic.registered_client()?;
    let checks = client.list_checks()?;
    if checks.is_empty() {
        println!("No checks found.");
        return Ok(ExitCode::SUCCESS);
    }
    println!("\n{:<25} {:<8} {:<10} {:<12} Target", "Job", "ID", "Enabled", "Frequency");
    println!("{}", "-".repeat(90));
    for c in &checks {
        println!(
            "{:<25} {:<8} {:<10} {:<12} {}",
            c.job,
            c.id,
            c.enabled,
            format!("{}s", c.frequency / 1000),
            c.target
        );
    }
    println!("\nTotal: {} checks", checks.len());
    Ok(ExitCode::SUCCESS)
}

fn list_probes(synthetic: &SyntheticArgs) -> anyhow::Result<ExitCode> {
    let client = synthetic.registered_client()?;
    let probes = client.list_probes()?;
    if probes.is_empty() {
        println!("No probes found.");
        return Ok(ExitCode::SUCCESS);
    }
    println!("\n{:<6} {:<30} {:<15} Online", "ID", "Name", "Region");
    println!("{}", "-".repeat(60));
    for p in &probes {
        println!("{:<6} {:<30} {:<15} {}", p.id, p.name, p.region, p.online);
    }
    println!("\nTotal: {} probes", probes.len());
    Ok(ExitCode::SUCCESS)
}
