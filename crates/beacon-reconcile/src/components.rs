//! Status-page component and metric reconciliation.

use std::collections::{BTreeMap, HashSet};

use tracing::{error, info, warn};

use beacon_core::{BeaconConfig, ComponentMapping, EndpointConfig, Failure, MappingEntry};
use beacon_statuspage::{
    Component, ComponentPatch, Metric, NewComponent, NewMetric, PageComponentStatus, StatusPageApi,
};

use crate::{ReconcileOptions, ReconcileReport};

/// Remote inventory fetched at the start of a pass.
struct Inventory {
    components: Vec<Component>,
    /// Empty when the metric listing failed.
    metrics: Vec<Metric>,
}

impl Inventory {
    fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    fn component_named(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    fn has_metric(&self, id: &str) -> bool {
        self.metrics.iter().any(|m| m.id == id)
    }

    fn metric_named(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

/// Converge status-page components and metrics with the configured
/// endpoints, starting from the stored `mapping`.
///
/// Returns the report and the regenerated mapping. When the component
/// listing fails the stored mapping is returned unchanged.
pub fn reconcile_statuspage<A: StatusPageApi + ?Sized>(
    api: &A,
    config: &BeaconConfig,
    mapping: &ComponentMapping,
    options: ReconcileOptions,
) -> (ReconcileReport, ComponentMapping) {
    let mut report = ReconcileReport::default();
    let mut mapping = mapping.clone();

    let components = match api.list_components() {
        Ok(list) => list,
        Err(e) => {
            error!(error = %e, "failed to list components");
            report.error(Failure::fatal("list components", e));
            return (report, mapping);
        }
    };
    let metrics = match api.list_metrics() {
        Ok(list) => list,
        Err(e) => {
            warn!(error = %e, "failed to list metrics (may be unavailable)");
            report.warn("list metrics", e);
            Vec::new()
        }
    };
    let inventory = Inventory {
        components,
        metrics,
    };

    let desired: HashSet<&str> = config.component_jobs().map(|(job, _)| job.as_str()).collect();

    for (job, endpoint) in config.component_jobs() {
        match converge_entry(api, &inventory, job, endpoint, mapping.get(job), &mut report) {
            Some(entry) => {
                mapping.insert(job.clone(), entry);
            }
            None => {
                mapping.remove(job);
            }
        }
    }

    let orphans: Vec<String> = mapping
        .keys()
        .filter(|job| !desired.contains(job.as_str()))
        .cloned()
        .collect();

    for job in orphans {
        let Some(entry) = mapping.get(&job).cloned() else {
            continue;
        };
        let name = display_name(&job, &entry);
        if !options.allow_deletions {
            warn!(
                component = %name,
                "component not in config, skipping deletion (set ALLOW_DELETIONS=true to remove)"
            );
            continue;
        }
        if let Some(id) = entry.component_id.as_deref()
            && inventory.component(id).is_none()
        {
            info!(component = %name, component_id = %id, "orphaned component already gone, dropping mapping");
            mapping.remove(&job);
            continue;
        }
        if remove_remote(api, name, &entry, &mut report) {
            mapping.remove(&job);
        }
    }

    (report, mapping)
}

/// Converge one desired endpoint. `None` means the endpoint has no
/// component and its mapping entry should be dropped.
fn converge_entry<A: StatusPageApi + ?Sized>(
    api: &A,
    inventory: &Inventory,
    job: &str,
    endpoint: &EndpointConfig,
    stored: Option<&MappingEntry>,
    report: &mut ReconcileReport,
) -> Option<MappingEntry> {
    let name = endpoint.name.as_str();

    let mut component_id = stored.and_then(|e| e.component_id.clone());
    if let Some(id) = &component_id
        && inventory.component(id).is_none()
    {
        warn!(component = %name, component_id = %id, "stored component no longer exists, recreating");
        component_id = None;
    }

    let mut metric_id = stored.and_then(|e| e.metric_id.clone());
    if let Some(id) = &metric_id
        && !inventory.has_metric(id)
    {
        warn!(component = %name, metric_id = %id, "stored metric no longer exists, recreating");
        metric_id = None;
    }

    let component_id = match component_id {
        Some(id) => {
            repair_drift(api, inventory, &id, endpoint, report);
            id
        }
        None => match inventory.component_named(name) {
            Some(existing) => {
                info!(component = %name, component_id = %existing.id, "adopted existing component");
                let id = existing.id.clone();
                repair_drift(api, inventory, &id, endpoint, report);
                id
            }
            None => {
                let new = NewComponent {
                    name: name.to_string(),
                    description: endpoint.description.clone(),
                    status: PageComponentStatus::Operational,
                };
                match api.create_component(&new) {
                    Ok(created) => {
                        info!(component = %name, component_id = %created.id, "component created");
                        report.created.push(format!("component:{name}"));
                        created.id
                    }
                    Err(e) => {
                        error!(%job, component = %name, error = %e, "failed to create component");
                        report.error(Failure::isolated(format!("create component {name}"), e));
                        return None;
                    }
                }
            }
        },
    };

    let metric_id = if !endpoint.metric {
        None
    } else if metric_id.is_some() {
        metric_id
    } else {
        adopt_or_create_metric(api, inventory, endpoint, report)
    };

    Some(MappingEntry {
        name: name.to_string(),
        component_id: Some(component_id),
        metric_id,
    })
}

/// Update a tracked component whose name or description drifted.
fn repair_drift<A: StatusPageApi + ?Sized>(
    api: &A,
    inventory: &Inventory,
    id: &str,
    endpoint: &EndpointConfig,
    report: &mut ReconcileReport,
) {
    let Some(remote) = inventory.component(id) else {
        return;
    };
    let patch = ComponentPatch {
        name: (remote.name != endpoint.name).then(|| endpoint.name.clone()),
        description: (remote.description != endpoint.description)
            .then(|| endpoint.description.clone()),
        status: None,
    };
    if patch.name.is_none() && patch.description.is_none() {
        return;
    }
    match api.update_component(id, &patch) {
        Ok(_) => {
            info!(component = %endpoint.name, component_id = %id, "component details updated");
            report.updated.push(format!("component:{}", endpoint.name));
        }
        Err(e) => {
            error!(component = %endpoint.name, error = %e, "failed to update component");
            report.error(Failure::isolated(format!("update component {}", endpoint.name), e));
        }
    }
}

fn adopt_or_create_metric<A: StatusPageApi + ?Sized>(
    api: &A,
    inventory: &Inventory,
    endpoint: &EndpointConfig,
    report: &mut ReconcileReport,
) -> Option<String> {
    let metric_name = endpoint.metric_name();
    if let Some(existing) = inventory.metric_named(&metric_name) {
        info!(metric = %metric_name, metric_id = %existing.id, "adopted existing metric");
        return Some(existing.id.clone());
    }
    match api.create_metric(&NewMetric::latency(&metric_name, &endpoint.name)) {
        Ok(created) => {
            info!(metric = %metric_name, metric_id = %created.id, "metric created");
            report.created.push(format!("metric:{metric_name}"));
            Some(created.id)
        }
        Err(e) => {
            warn!(metric = %metric_name, error = %e, "failed to create metric");
            report.warn(format!("create metric {metric_name}"), e);
            None
        }
    }
}

/// Delete an entry's metric, then its component.
///
/// Returns whether the entry can be dropped from the mapping: a failed
/// metric delete is only a warning, a failed component delete keeps it.
pub(crate) fn remove_remote<A: StatusPageApi + ?Sized>(
    api: &A,
    name: &str,
    entry: &MappingEntry,
    report: &mut ReconcileReport,
) -> bool {
    if let Some(metric_id) = entry.metric_id.as_deref() {
        match api.delete_metric(metric_id) {
            Ok(()) => {
                info!(component = %name, %metric_id, "metric deleted");
                report.deleted.push(format!("metric:{name}"));
            }
            Err(e) => {
                warn!(component = %name, %metric_id, error = %e, "failed to delete metric");
                report.warn(format!("delete metric {name}"), e);
            }
        }
    }

    if let Some(component_id) = entry.component_id.as_deref() {
        match api.delete_component(component_id) {
            Ok(()) => {
                info!(component = %name, %component_id, "component deleted");
                report.deleted.push(format!("component:{name}"));
            }
            Err(e) => {
                error!(component = %name, %component_id, error = %e, "failed to delete component");
                report.error(Failure::isolated(format!("delete component {name}"), e));
                return false;
            }
        }
    }
    true
}

pub(crate) fn display_name<'a>(job: &'a str, entry: &'a MappingEntry) -> &'a str {
    if entry.name.is_empty() { job } else { &entry.name }
}

/// Remote components keyed by name.
pub(crate) fn by_name(components: &[Component]) -> BTreeMap<&str, &Component> {
    components.iter().map(|c| (c.name.as_str(), c)).collect()
}
