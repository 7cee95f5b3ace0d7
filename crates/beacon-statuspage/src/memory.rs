//! In-memory status page for tests and dry runs.
//!
//! Holds components, metrics, and incidents in a `RefCell` and records every
//! mutating call so callers can assert exactly what would have been sent.
//! Individual operations can be made to fail with [`InMemoryStatusPage::fail`].

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::client::StatusPageApi;
use crate::error::{StatusPageError, StatusPageResult};
use crate::types::*;

/// Names of the API operations, for fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOp {
    ListComponents,
    CreateComponent,
    UpdateComponent,
    DeleteComponent,
    ListMetrics,
    CreateMetric,
    DeleteMetric,
    SubmitMetricData,
    ListUnresolvedIncidents,
    ListIncidents,
    GetIncident,
    CreateIncident,
    UpdateIncident,
    CreatePostmortem,
}

/// A recorded mutating call.
#[derive(Debug, Clone, PartialEq)]
pub enum PageCall {
    CreateComponent(NewComponent),
    UpdateComponent { id: String, patch: ComponentPatch },
    DeleteComponent(String),
    CreateMetric(NewMetric),
    DeleteMetric(String),
    SubmitMetricData { id: String, timestamp: i64, value: f64 },
    CreateIncident(NewIncident),
    UpdateIncident { id: String, patch: IncidentPatch },
    CreatePostmortem { incident_id: String, postmortem: Postmortem },
}

#[derive(Default)]
struct PageState {
    components: Vec<Component>,
    metrics: Vec<Metric>,
    incidents: Vec<Incident>,
    calls: Vec<PageCall>,
}

pub struct InMemoryStatusPage {
    state: RefCell<PageState>,
    failing: RefCell<HashSet<PageOp>>,
    next_id: Cell<u64>,
    now: Cell<DateTime<Utc>>,
}

impl Default for InMemoryStatusPage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStatusPage {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(PageState::default()),
            failing: RefCell::new(HashSet::new()),
            next_id: Cell::new(1),
            now: Cell::new(Utc::now()),
        }
    }

    /// Timestamp given to incidents and updates created from now on.
    pub fn set_now(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    /// Make every subsequent call of `op` fail.
    pub fn fail(&self, op: PageOp) {
        self.failing.borrow_mut().insert(op);
    }

    pub fn recover(&self, op: PageOp) {
        self.failing.borrow_mut().remove(&op);
    }

    // ── Seeding (not recorded) ────────────────────────────────────

    pub fn seed_component(&self, name: &str, description: &str) -> Component {
        let component = Component {
            id: self.fresh_id("cmp"),
            name: name.to_string(),
            description: description.to_string(),
            status: PageComponentStatus::Operational,
        };
        self.state.borrow_mut().components.push(component.clone());
        component
    }

    pub fn seed_metric(&self, name: &str) -> Metric {
        let metric = Metric {
            id: self.fresh_id("met"),
            name: name.to_string(),
            suffix: "ms".to_string(),
        };
        self.state.borrow_mut().metrics.push(metric.clone());
        metric
    }

    pub fn seed_incident(&self, incident: Incident) {
        self.state.borrow_mut().incidents.push(incident);
    }

    /// Remove a component behind Beacon's back.
    pub fn drop_component(&self, id: &str) {
        self.state.borrow_mut().components.retain(|c| c.id != id);
    }

    pub fn drop_metric(&self, id: &str) {
        self.state.borrow_mut().metrics.retain(|m| m.id != id);
    }

    // ── Inspection ────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<PageCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn components(&self) -> Vec<Component> {
        self.state.borrow().components.clone()
    }

    pub fn metrics(&self) -> Vec<Metric> {
        self.state.borrow().metrics.clone()
    }

    pub fn incidents(&self) -> Vec<Incident> {
        self.state.borrow().incidents.clone()
    }

    fn check(&self, op: PageOp) -> StatusPageResult<()> {
        if self.failing.borrow().contains(&op) {
            return Err(StatusPageError::Api {
                status: 500,
                body: format!("{op:?} unavailable"),
            });
        }
        Ok(())
    }

    fn record(&self, call: PageCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        format!("{prefix}-{id}")
    }

    fn stamp(&self) -> String {
        self.now.get().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn set_component_statuses<'a>(
        &self,
        statuses: impl IntoIterator<Item = (&'a String, &'a PageComponentStatus)>,
    ) {
        let mut state = self.state.borrow_mut();
        for (id, status) in statuses {
            if let Some(c) = state.components.iter_mut().find(|c| &c.id == id) {
                c.status = *status;
            }
        }
    }
}

impl StatusPageApi for InMemoryStatusPage {
    fn list_components(&self) -> StatusPageResult<Vec<Component>> {
        self.check(PageOp::ListComponents)?;
        Ok(self.components())
    }

    fn create_component(&self, component: &NewComponent) -> StatusPageResult<Component> {
        self.check(PageOp::CreateComponent)?;
        self.record(PageCall::CreateComponent(component.clone()));
        let created = Component {
            id: self.fresh_id("cmp"),
            name: component.name.clone(),
            description: component.description.clone(),
            status: component.status,
        };
        self.state.borrow_mut().components.push(created.clone());
        Ok(created)
    }

    fn update_component(&self, id: &str, patch: &ComponentPatch) -> StatusPageResult<Component> {
        self.check(PageOp::UpdateComponent)?;
        self.record(PageCall::UpdateComponent {
            id: id.to_string(),
            patch: patch.clone(),
        });
        let mut state = self.state.borrow_mut();
        let component = state
            .components
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StatusPageError::NotFound(format!("component {id}")))?;
        if let Some(name) = &patch.name {
            component.name = name.clone();
        }
        if let Some(description) = &patch.description {
            component.description = description.clone();
        }
        if let Some(status) = patch.status {
            component.status = status;
        }
        Ok(component.clone())
    }

    fn delete_component(&self, id: &str) -> StatusPageResult<()> {
        self.check(PageOp::DeleteComponent)?;
        self.record(PageCall::DeleteComponent(id.to_string()));
        let mut state = self.state.borrow_mut();
        let before = state.components.len();
        state.components.retain(|c| c.id != id);
        if state.components.len() == before {
            return Err(StatusPageError::NotFound(format!("component {id}")));
        }
        Ok(())
    }

    fn list_metrics(&self) -> StatusPageResult<Vec<Metric>> {
        self.check(PageOp::ListMetrics)?;
        Ok(self.metrics())
    }

    fn create_metric(&self, metric: &NewMetric) -> StatusPageResult<Metric> {
        self.check(PageOp::CreateMetric)?;
        self.record(PageCall::CreateMetric(metric.clone()));
        let created = Metric {
            id: self.fresh_id("met"),
            name: metric.name.clone(),
            suffix: metric.suffix.clone(),
        };
        self.state.borrow_mut().metrics.push(created.clone());
        Ok(created)
    }

    fn delete_metric(&self, id: &str) -> StatusPageResult<()> {
        self.check(PageOp::DeleteMetric)?;
        self.record(PageCall::DeleteMetric(id.to_string()));
        let mut state = self.state.borrow_mut();
        let before = state.metrics.len();
        state.metrics.retain(|m| m.id != id);
        if state.metrics.len() == before {
            return Err(StatusPageError::NotFound(format!("metric {id}")));
        }
        Ok(())
    }

    fn submit_metric_data(&self, id: &str, timestamp: i64, value: f64) -> StatusPageResult<()> {
        self.check(PageOp::SubmitMetricData)?;
        self.record(PageCall::SubmitMetricData {
            id: id.to_string(),
            timestamp,
            value,
        });
        Ok(())
    }

    fn list_unresolved_incidents(&self) -> StatusPageResult<Vec<Incident>> {
        self.check(PageOp::ListUnresolvedIncidents)?;
        Ok(self
            .incidents()
            .into_iter()
            .filter(|i| {
                !matches!(
                    i.status,
                    IncidentStatus::Resolved | IncidentStatus::Postmortem
                )
            })
            .collect())
    }

    fn list_incidents(&self) -> StatusPageResult<Vec<Incident>> {
        self.check(PageOp::ListIncidents)?;
        Ok(self.incidents())
    }

    fn get_incident(&self, id: &str) -> StatusPageResult<Incident> {
        self.check(PageOp::GetIncident)?;
        self.state
            .borrow()
            .incidents
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| StatusPageError::NotFound(format!("incident {id}")))
    }

    fn create_incident(&self, incident: &NewIncident) -> StatusPageResult<Incident> {
        self.check(PageOp::CreateIncident)?;
        self.record(PageCall::CreateIncident(incident.clone()));
        let stamp = self.stamp();
        let created = Incident {
            id: self.fresh_id("inc"),
            name: incident.name.clone(),
            status: incident.status,
            impact: incident.impact_override.unwrap_or(Impact::None),
            components: incident
                .component_ids
                .iter()
                .map(|id| AffectedComponent {
                    id: id.clone(),
                    name: String::new(),
                })
                .collect(),
            incident_updates: vec![IncidentUpdate {
                status: incident.status.as_str().to_string(),
                body: incident.body.clone(),
                created_at: Some(stamp.clone()),
            }],
            created_at: Some(stamp),
        };
        self.set_component_statuses(&incident.components);
        self.state.borrow_mut().incidents.push(created.clone());
        Ok(created)
    }

    fn update_incident(&self, id: &str, patch: &IncidentPatch) -> StatusPageResult<Incident> {
        self.check(PageOp::UpdateIncident)?;
        self.record(PageCall::UpdateIncident {
            id: id.to_string(),
            patch: patch.clone(),
        });
        let stamp = self.stamp();
        let updated = {
            let mut state = self.state.borrow_mut();
            let incident = state
                .incidents
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| StatusPageError::NotFound(format!("incident {id}")))?;
            if let Some(name) = &patch.name {
                incident.name = name.clone();
            }
            if let Some(status) = patch.status {
                incident.status = status;
            }
            if let Some(impact) = patch.impact_override {
                incident.impact = impact;
            }
            // Newest first, as the API returns them.
            incident.incident_updates.insert(
                0,
                IncidentUpdate {
                    status: incident.status.as_str().to_string(),
                    body: patch.body.clone().unwrap_or_default(),
                    created_at: Some(stamp),
                },
            );
            incident.clone()
        };
        self.set_component_statuses(&patch.components);
        Ok(updated)
    }

    fn create_postmortem(
        &self,
        incident_id: &str,
        postmortem: &Postmortem,
    ) -> StatusPageResult<()> {
        self.check(PageOp::CreatePostmortem)?;
        self.record(PageCall::CreatePostmortem {
            incident_id: incident_id.to_string(),
            postmortem: postmortem.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_components_are_listed() {
        let page = InMemoryStatusPage::new();
        let c = page
            .create_component(&NewComponent {
                name: "API".to_string(),
                description: String::new(),
                status: PageComponentStatus::Operational,
            })
            .unwrap();
        assert_eq!(page.list_components().unwrap(), vec![c]);
        assert_eq!(page.calls().len(), 1);
    }

    #[test]
    fn resolved_incidents_leave_unresolved_list() {
        let page = InMemoryStatusPage::new();
        let inc = page
            .create_incident(&NewIncident {
                name: "API down".to_string(),
                status: IncidentStatus::Investigating,
                body: "b".to_string(),
                component_ids: vec!["c1".to_string()],
                components: Default::default(),
                deliver_notifications: false,
                impact_override: Some(Impact::Critical),
            })
            .unwrap();
        assert_eq!(page.list_unresolved_incidents().unwrap().len(), 1);

        let patch = IncidentPatch {
            status: Some(IncidentStatus::Resolved),
            ..IncidentPatch::default()
        };
        let resolved = page.update_incident(&inc.id, &patch).unwrap();
        assert_eq!(resolved.incident_updates.len(), 2);
        assert!(page.list_unresolved_incidents().unwrap().is_empty());
    }

    #[test]
    fn injected_failures_surface_and_recover() {
        let page = InMemoryStatusPage::new();
        page.fail(PageOp::ListMetrics);
        assert!(page.list_metrics().is_err());
        page.recover(PageOp::ListMetrics);
        assert!(page.list_metrics().unwrap().is_empty());
    }

    #[test]
    fn deleting_unknown_component_is_not_found() {
        let page = InMemoryStatusPage::new();
        assert!(matches!(
            page.delete_component("nope"),
            Err(StatusPageError::NotFound(_))
        ));
    }
}
