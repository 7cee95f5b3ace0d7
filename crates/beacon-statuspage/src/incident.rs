//! Incident lifecycle engine.
//!
//! One pass evaluates every mapped component against the latest status
//! report and the page's unresolved incidents:
//!
//! ```text
//!   status        open incident   action
//!   ─────────     ─────────────   ──────────────────────────────────────
//!   unhealthy     none            create (investigating, impact by severity)
//!   unhealthy     yes             escalate if impact differs, else
//!                                 heartbeat unless inside the quiet period
//!   operational   yes             resolve, then publish a postmortem
//!   operational   none            nothing
//! ```
//!
//! Only the unresolved-incident listing is fatal. Every other failure is
//! recorded against its component and the pass moves on.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use beacon_core::{ComponentMapping, ComponentStatus, Failure, IncidentSettings, StatusReport};

use crate::client::StatusPageApi;
use crate::narrative;
use crate::postmortem::render_postmortem;
use crate::types::*;

/// Incident automation settings for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncidentPolicy {
    pub auto_create: bool,
    pub auto_postmortem: bool,
    pub notify_subscribers: bool,
    /// Minimum minutes between non-escalating updates; 0 disables suppression.
    pub quiet_period_minutes: u32,
}

impl Default for IncidentPolicy {
    fn default() -> Self {
        IncidentSettings::default().into()
    }
}

impl From<&IncidentSettings> for IncidentPolicy {
    fn from(s: &IncidentSettings) -> Self {
        Self {
            auto_create: s.auto_create,
            auto_postmortem: s.auto_postmortem,
            notify_subscribers: s.notify_subscribers,
            quiet_period_minutes: s.quiet_period_minutes,
        }
    }
}

impl From<IncidentSettings> for IncidentPolicy {
    fn from(s: IncidentSettings) -> Self {
        (&s).into()
    }
}

/// What the engine decided for one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    None,
    Create { impact: Impact },
    Escalate { from: Impact, to: Impact },
    Heartbeat,
    Suppress { elapsed_minutes: i64 },
    Resolve,
}

/// Decide the action for a component at `status` given its open incident.
pub fn decide(
    status: ComponentStatus,
    open: Option<&Incident>,
    policy: &IncidentPolicy,
    now: DateTime<Utc>,
) -> Decision {
    match (status.is_healthy(), open) {
        (true, None) => Decision::None,
        (true, Some(_)) => Decision::Resolve,
        (false, None) => Decision::Create {
            impact: Impact::for_status(status),
        },
        (false, Some(incident)) => {
            let impact = Impact::for_status(status);
            if impact != incident.impact {
                return Decision::Escalate {
                    from: incident.impact,
                    to: impact,
                };
            }
            if policy.quiet_period_minutes == 0 {
                return Decision::Heartbeat;
            }
            match incident.last_update_time() {
                Some(last) => {
                    let elapsed_minutes = (now - last).num_minutes();
                    if elapsed_minutes < i64::from(policy.quiet_period_minutes) {
                        Decision::Suppress { elapsed_minutes }
                    } else {
                        Decision::Heartbeat
                    }
                }
                None => Decision::Heartbeat,
            }
        }
    }
}

/// A component/incident pair touched by the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncidentRef {
    pub component: String,
    pub incident_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedIncident {
    pub component: String,
    pub incident_id: String,
    pub status: ComponentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedIncident {
    pub component: String,
    pub incident_id: String,
    pub status: ComponentStatus,
    pub escalated: bool,
}

/// Outcome of one incident pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IncidentRunReport {
    pub created: Vec<CreatedIncident>,
    pub updated: Vec<UpdatedIncident>,
    pub resolved: Vec<IncidentRef>,
    pub suppressed: Vec<IncidentRef>,
    pub errors: Vec<Failure>,
}

impl IncidentRunReport {
    /// Whether any failure other than a best-effort one occurred.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(Failure::is_error)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} created, {} updated, {} resolved, {} suppressed, {} errors",
            self.created.len(),
            self.updated.len(),
            self.resolved.len(),
            self.suppressed.len(),
            self.errors.len()
        )
    }
}

/// Runs incident passes against a status page.
pub struct IncidentEngine<'a, A: ?Sized> {
    api: &'a A,
    policy: IncidentPolicy,
}

impl<'a, A: StatusPageApi + ?Sized> IncidentEngine<'a, A> {
    pub fn new(api: &'a A, policy: IncidentPolicy) -> Self {
        Self { api, policy }
    }

    pub fn run(
        &self,
        mapping: &ComponentMapping,
        report: &StatusReport,
        now: DateTime<Utc>,
    ) -> IncidentRunReport {
        let mut out = IncidentRunReport::default();

        if !self.policy.auto_create {
            info!("incident automation disabled, skipping");
            return out;
        }

        let unresolved = match self.api.list_unresolved_incidents() {
            Ok(list) => list,
            Err(e) => {
                error!(error = %e, "failed to fetch unresolved incidents");
                out.errors.push(Failure::fatal("unresolved incidents", e));
                return out;
            }
        };
        info!(count = unresolved.len(), "unresolved incidents fetched");

        for (job_label, entry) in mapping {
            let Some(component_id) = entry.component_id.as_deref() else {
                debug!(%job_label, "no component id, skipping");
                continue;
            };
            let name = if entry.name.is_empty() {
                job_label.as_str()
            } else {
                entry.name.as_str()
            };
            let Some(observed) = report.component(name) else {
                debug!(component = %name, "no status data, skipping");
                continue;
            };

            let open = unresolved
                .iter()
                .find(|i| i.status.is_open() && i.affects(component_id));
            let target = Target {
                component_id,
                name,
                status: observed.status,
            };
            match decide(observed.status, open, &self.policy, now) {
                Decision::None => {}
                Decision::Create { impact } => self.create(&target, impact, &mut out),
                Decision::Escalate { from, to } => {
                    if let Some(incident) = open {
                        info!(incident_id = %incident.id, component = %name, %from, %to, "escalating incident");
                        self.update(&target, incident, Some(to), &mut out);
                    }
                }
                Decision::Heartbeat => {
                    if let Some(incident) = open {
                        self.update(&target, incident, None, &mut out);
                    }
                }
                Decision::Suppress { elapsed_minutes } => {
                    if let Some(incident) = open {
                        info!(
                            incident_id = %incident.id,
                            component = %name,
                            elapsed_minutes,
                            quiet_period = self.policy.quiet_period_minutes,
                            "update suppressed"
                        );
                        out.suppressed.push(IncidentRef {
                            component: name.to_string(),
                            incident_id: incident.id.clone(),
                        });
                    }
                }
                Decision::Resolve => {
                    if let Some(incident) = open {
                        self.resolve(&target, incident, now, &mut out);
                    }
                }
            }
        }

        out
    }

    fn create(&self, target: &Target<'_>, impact: Impact, out: &mut IncidentRunReport) {
        let new = NewIncident {
            name: narrative::incident_name(target.name, target.status),
            status: IncidentStatus::Investigating,
            body: narrative::creation_body(target.name, target.status),
            component_ids: vec![target.component_id.to_string()],
            components: target.statuses(target.status.into()),
            deliver_notifications: self.policy.notify_subscribers,
            impact_override: Some(impact),
        };
        match self.api.create_incident(&new) {
            Ok(incident) => {
                info!(incident_id = %incident.id, component = %target.name, %impact, "incident created");
                out.created.push(CreatedIncident {
                    component: target.name.to_string(),
                    incident_id: incident.id,
                    status: target.status,
                });
            }
            Err(e) => {
                error!(component = %target.name, error = %e, "failed to create incident");
                out.errors.push(Failure::isolated(
                    format!("create incident for {}", target.name),
                    e,
                ));
            }
        }
    }

    /// Post an update to an open incident. `escalate_to` is set when the
    /// impact changes; otherwise this is a silent heartbeat.
    fn update(
        &self,
        target: &Target<'_>,
        incident: &Incident,
        escalate_to: Option<Impact>,
        out: &mut IncidentRunReport,
    ) {
        let escalated = escalate_to.is_some();
        let patch = IncidentPatch {
            name: escalated.then(|| narrative::incident_name(target.name, target.status)),
            status: Some(IncidentStatus::Identified),
            body: Some(match escalate_to {
                Some(to) => narrative::escalation_body(
                    target.name,
                    target.status,
                    to.worsens(incident.impact),
                ),
                None => narrative::heartbeat_body(target.name, target.status),
            }),
            components: target.statuses(target.status.into()),
            deliver_notifications: escalated && self.policy.notify_subscribers,
            impact_override: escalate_to,
        };
        match self.api.update_incident(&incident.id, &patch) {
            Ok(_) => {
                if !escalated {
                    info!(incident_id = %incident.id, component = %target.name, "heartbeat posted");
                }
                out.updated.push(UpdatedIncident {
                    component: target.name.to_string(),
                    incident_id: incident.id.clone(),
                    status: target.status,
                    escalated,
                });
            }
            Err(e) => {
                error!(incident_id = %incident.id, error = %e, "failed to update incident");
                out.errors.push(Failure::isolated(format!("update incident {}", incident.id), e));
            }
        }
    }

    fn resolve(
        &self,
        target: &Target<'_>,
        incident: &Incident,
        now: DateTime<Utc>,
        out: &mut IncidentRunReport,
    ) {
        let patch = IncidentPatch {
            status: Some(IncidentStatus::Resolved),
            body: Some(narrative::resolution_body(target.name)),
            components: target.statuses(PageComponentStatus::Operational),
            deliver_notifications: self.policy.notify_subscribers,
            ..IncidentPatch::default()
        };
        if let Err(e) = self.api.update_incident(&incident.id, &patch) {
            error!(incident_id = %incident.id, error = %e, "failed to resolve incident");
            out.errors.push(Failure::isolated(format!("resolve incident {}", incident.id), e));
            return;
        }
        info!(incident_id = %incident.id, component = %target.name, "incident resolved");
        out.resolved.push(IncidentRef {
            component: target.name.to_string(),
            incident_id: incident.id.clone(),
        });

        if self.policy.auto_postmortem {
            self.publish_postmortem(target, incident, now, out);
        }
    }

    fn publish_postmortem(
        &self,
        target: &Target<'_>,
        known: &Incident,
        now: DateTime<Utc>,
        out: &mut IncidentRunReport,
    ) {
        let full = match self.api.get_incident(&known.id) {
            Ok(incident) => incident,
            Err(e) => {
                debug!(incident_id = %known.id, error = %e, "using cached incident for postmortem");
                known.clone()
            }
        };
        let postmortem = Postmortem {
            body: render_postmortem(&full, target.name, now),
            notify_subscribers: self.policy.notify_subscribers,
            notify_twitter: false,
        };
        match self.api.create_postmortem(&known.id, &postmortem) {
            Ok(()) => info!(incident_id = %known.id, component = %target.name, "postmortem published"),
            Err(e) => {
                warn!(
                    incident_id = %known.id,
                    error = %e,
                    "failed to publish postmortem (incident was resolved)"
                );
                out.errors
                    .push(Failure::best_effort(format!("postmortem for incident {}", known.id), e));
            }
        }
    }
}

struct Target<'a> {
    component_id: &'a str,
    name: &'a str,
    status: ComponentStatus,
}

impl Target<'_> {
    fn statuses(&self, status: PageComponentStatus) -> BTreeMap<String, PageComponentStatus> {
        BTreeMap::from([(self.component_id.to_string(), status)])
    }
}
