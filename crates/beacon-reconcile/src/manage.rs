//! Targeted mapping operations behind `beacon manage`.
//!
//! Unlike [`reconcile_statuspage`](crate::reconcile_statuspage) these never
//! touch entries they were not asked about. Each one edits the mapping in
//! place; the caller persists it.

use tracing::{error, info, warn};

use beacon_core::{Check, ComponentMapping, Failure, MappingEntry};
use beacon_statuspage::{NewComponent, NewMetric, PageComponentStatus, StatusPageApi};

use crate::ReconcileReport;
use crate::components::{by_name, display_name, remove_remote};

/// Make sure every check has a component id: keep existing ids, adopt a
/// same-named remote component, or create one.
pub fn adopt_components<A: StatusPageApi + ?Sized>(
    api: &A,
    checks: &[Check],
    mapping: &mut ComponentMapping,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let existing = match api.list_components() {
        Ok(list) => list,
        Err(e) => {
            error!(error = %e, "failed to list components");
            report.error(Failure::fatal("list components", e));
            return report;
        }
    };
    let existing = by_name(&existing);

    for check in checks {
        let stored = mapping.get(&check.job_label);
        if let Some(id) = stored.and_then(|e| e.component_id.as_deref()) {
            info!(component = %check.name, component_id = %id, "already configured");
            continue;
        }
        let metric_id = stored.and_then(|e| e.metric_id.clone());

        let component_id = match existing.get(check.name.as_str()) {
            Some(found) => {
                info!(component = %check.name, component_id = %found.id, "adopted existing component");
                found.id.clone()
            }
            None => {
                let new = NewComponent {
                    name: check.name.clone(),
                    description: check.description.clone(),
                    status: PageComponentStatus::Operational,
                };
                match api.create_component(&new) {
                    Ok(created) => {
                        info!(component = %check.name, component_id = %created.id, "component created");
                        report.created.push(format!("component:{}", check.name));
                        created.id
                    }
                    Err(e) => {
                        error!(component = %check.name, error = %e, "failed to create component");
                        report.error(Failure::isolated(format!("create component {}", check.name), e));
                        continue;
                    }
                }
            }
        };

        mapping.insert(
            check.job_label.clone(),
            MappingEntry {
                name: check.name.clone(),
                component_id: Some(component_id),
                metric_id,
            },
        );
    }

    report
}

/// Give every mapping entry a latency metric, adopting by name first.
pub fn adopt_metrics<A: StatusPageApi + ?Sized>(
    api: &A,
    mapping: &mut ComponentMapping,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    if mapping.is_empty() {
        warn!("no component mappings, run sync-components first");
        return report;
    }

    let existing = match api.list_metrics() {
        Ok(list) => list,
        Err(e) => {
            error!(error = %e, "failed to list metrics");
            report.error(Failure::fatal("list metrics", e));
            return report;
        }
    };

    for (job, entry) in mapping.iter_mut() {
        if entry.metric_id.is_some() {
            continue;
        }
        let name = display_name(job, entry).to_string();
        let metric_name = format!("{name} Latency");

        if let Some(found) = existing.iter().find(|m| m.name == metric_name) {
            info!(metric = %metric_name, metric_id = %found.id, "adopted existing metric");
            entry.metric_id = Some(found.id.clone());
            continue;
        }
        match api.create_metric(&NewMetric::latency(&metric_name, &name)) {
            Ok(created) => {
                info!(metric = %metric_name, metric_id = %created.id, "metric created");
                report.created.push(format!("metric:{metric_name}"));
                entry.metric_id = Some(created.id);
            }
            Err(e) => {
                warn!(metric = %metric_name, error = %e, "failed to create metric (metrics may be disabled for this page)");
                report.warn(format!("create metric {metric_name}"), e);
            }
        }
    }

    report
}

/// Delete one entry's metric and component and drop it from the mapping.
pub fn delete_component<A: StatusPageApi + ?Sized>(
    api: &A,
    mapping: &mut ComponentMapping,
    job_label: &str,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let Some(entry) = mapping.get(job_label).cloned() else {
        error!(%job_label, "job label not found in mapping");
        report.error(Failure::fatal(job_label, "job label not found in mapping"));
        return report;
    };
    if entry.component_id.is_none() {
        warn!(%job_label, "no component id, removing from mapping only");
        mapping.remove(job_label);
        return report;
    }
    if remove_remote(api, display_name(job_label, &entry), &entry, &mut report) {
        mapping.remove(job_label);
    }
    report
}

/// Delete one entry's metric and clear its metric id.
pub fn delete_metric<A: StatusPageApi + ?Sized>(
    api: &A,
    mapping: &mut ComponentMapping,
    job_label: &str,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let Some(entry) = mapping.get_mut(job_label) else {
        error!(%job_label, "job label not found in mapping");
        report.error(Failure::fatal(job_label, "job label not found in mapping"));
        return report;
    };
    let Some(metric_id) = entry.metric_id.clone() else {
        warn!(%job_label, "no metric id, nothing to delete");
        return report;
    };

    match api.delete_metric(&metric_id) {
        Ok(()) => {
            info!(%job_label, %metric_id, "metric deleted");
            report.deleted.push(format!("metric:{}", display_name(job_label, entry)));
            entry.metric_id = None;
        }
        Err(e) => {
            error!(%job_label, error = %e, "failed to delete metric");
            report.error(Failure::isolated(format!("delete metric {job_label}"), e));
        }
    }
    report
}

/// Delete every managed metric and component.
///
/// Entries whose component could not be deleted stay in the mapping.
pub fn cleanup<A: StatusPageApi + ?Sized>(
    api: &A,
    mapping: &mut ComponentMapping,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let jobs: Vec<String> = mapping.keys().cloned().collect();

    for job in jobs {
        let Some(entry) = mapping.get(&job).cloned() else {
            continue;
        };
        if remove_remote(api, display_name(&job, &entry), &entry, &mut report) {
            mapping.remove(&job);
        }
    }

    if report.has_errors() {
        warn!(remaining = mapping.len(), "cleanup finished with errors");
    } else {
        info!("cleanup complete, all managed components removed");
    }
    report
}
