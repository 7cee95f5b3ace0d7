//! Incident lifecycle scenarios.
//!
//! Drives the engine against the in-memory page through the full life of
//! an incident: open, escalate, suppress, heartbeat, resolve.

use beacon_core::{
    ComponentMapping, ComponentReport, ComponentStatus, FailureKind, MappingEntry, StatusReport,
};
use beacon_statuspage::*;
use chrono::{DateTime, Duration, TimeZone, Utc};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 14, 9, 0, 0).unwrap()
}

fn report(status: ComponentStatus, at: DateTime<Utc>) -> StatusReport {
    StatusReport {
        last_updated: at,
        overall_status: status,
        components: vec![ComponentReport {
            name: "API".to_string(),
            description: "Public API".to_string(),
            status,
            reachability: Some(90.0),
            latency_ms: Some(250.0),
            last_checked: at,
        }],
    }
}

struct Fixture {
    page: InMemoryStatusPage,
    mapping: ComponentMapping,
    component_id: String,
}

fn fixture() -> Fixture {
    let page = InMemoryStatusPage::new();
    page.set_now(t0());
    let component = page.seed_component("API", "Public API");
    let mapping = ComponentMapping::from([(
        "api".to_string(),
        MappingEntry {
            name: "API".to_string(),
            component_id: Some(component.id.clone()),
            metric_id: None,
        },
    )]);
    Fixture {
        page,
        mapping,
        component_id: component.id,
    }
}

fn policy(quiet_period_minutes: u32) -> IncidentPolicy {
    IncidentPolicy {
        quiet_period_minutes,
        ..IncidentPolicy::default()
    }
}

fn incident_creates(calls: &[PageCall]) -> Vec<&NewIncident> {
    calls
        .iter()
        .filter_map(|c| match c {
            PageCall::CreateIncident(n) => Some(n),
            _ => None,
        })
        .collect()
}

fn incident_updates(calls: &[PageCall]) -> Vec<&IncidentPatch> {
    calls
        .iter()
        .filter_map(|c| match c {
            PageCall::UpdateIncident { patch, .. } => Some(patch),
            _ => None,
        })
        .collect()
}

fn postmortems(calls: &[PageCall]) -> Vec<&Postmortem> {
    calls
        .iter()
        .filter_map(|c| match c {
            PageCall::CreatePostmortem { postmortem, .. } => Some(postmortem),
            _ => None,
        })
        .collect()
}

/// Open a minor incident for API at `t0`.
fn open_minor(f: &Fixture) -> String {
    let engine = IncidentEngine::new(&f.page, policy(60));
    let out = engine.run(&f.mapping, &report(ComponentStatus::DegradedPerformance, t0()), t0());
    f.page.clear_calls();
    out.created[0].incident_id.clone()
}

#[test]
fn degraded_component_opens_minor_investigating_incident() {
    let f = fixture();
    let engine = IncidentEngine::new(&f.page, policy(60));

    let out = engine.run(&f.mapping, &report(ComponentStatus::DegradedPerformance, t0()), t0());

    assert_eq!(out.created.len(), 1);
    assert!(out.updated.is_empty() && out.resolved.is_empty() && out.errors.is_empty());

    let calls = f.page.calls();
    let creates = incident_creates(&calls);
    assert_eq!(creates.len(), 1);
    assert_eq!(calls.len(), 1);
    let new = creates[0];
    assert_eq!(new.status, IncidentStatus::Investigating);
    assert_eq!(new.impact_override, Some(Impact::Minor));
    assert_eq!(new.name, "API experiencing degraded performance");
    assert_eq!(new.component_ids, vec![f.component_id.clone()]);
    assert_eq!(
        new.components.get(&f.component_id),
        Some(&PageComponentStatus::DegradedPerformance)
    );
    assert!(new.deliver_notifications);
}

#[test]
fn outage_escalates_regardless_of_quiet_period() {
    let f = fixture();
    let id = open_minor(&f);

    let later = t0() + Duration::minutes(2);
    let engine = IncidentEngine::new(&f.page, policy(60));
    let out = engine.run(&f.mapping, &report(ComponentStatus::MajorOutage, later), later);

    assert_eq!(out.updated.len(), 1);
    assert!(out.updated[0].escalated);
    assert_eq!(out.updated[0].incident_id, id);
    assert!(out.suppressed.is_empty());

    let calls = f.page.calls();
    let updates = incident_updates(&calls);
    assert_eq!(updates.len(), 1);
    let patch = updates[0];
    assert_eq!(patch.impact_override, Some(Impact::Critical));
    assert_eq!(patch.status, Some(IncidentStatus::Identified));
    assert!(patch.deliver_notifications);
    assert_eq!(patch.name.as_deref(), Some("API experiencing a major outage"));
    assert!(patch.body.as_deref().unwrap_or_default().contains("escalated"));
}

#[test]
fn partial_recovery_is_not_announced_as_escalation() {
    let f = fixture();
    let engine = IncidentEngine::new(&f.page, policy(60));
    engine.run(&f.mapping, &report(ComponentStatus::MajorOutage, t0()), t0());
    f.page.clear_calls();

    let later = t0() + Duration::minutes(5);
    let out = engine.run(&f.mapping, &report(ComponentStatus::DegradedPerformance, later), later);

    assert_eq!(out.updated.len(), 1);
    let calls = f.page.calls();
    let patch = incident_updates(&calls)[0];
    assert_eq!(patch.impact_override, Some(Impact::Minor));
    assert_eq!(patch.name.as_deref(), Some("API experiencing degraded performance"));
    let body = patch.body.as_deref().unwrap_or_default();
    assert!(body.contains("has improved"));
    assert!(!body.contains("escalated"));
}

#[test]
fn escalation_notifications_follow_global_switch() {
    let f = fixture();
    open_minor(&f);

    let quiet = IncidentPolicy {
        notify_subscribers: false,
        ..policy(60)
    };
    let engine = IncidentEngine::new(&f.page, quiet);
    engine.run(&f.mapping, &report(ComponentStatus::MajorOutage, t0()), t0());

    let calls = f.page.calls();
    assert!(!incident_updates(&calls)[0].deliver_notifications);
}

#[test]
fn unchanged_status_inside_quiet_period_is_suppressed() {
    let f = fixture();
    let id = open_minor(&f);

    let later = t0() + Duration::minutes(10);
    let engine = IncidentEngine::new(&f.page, policy(60));
    let out = engine.run(&f.mapping, &report(ComponentStatus::DegradedPerformance, later), later);

    assert_eq!(out.suppressed.len(), 1);
    assert_eq!(out.suppressed[0].incident_id, id);
    assert!(out.updated.is_empty());
    assert!(f.page.calls().is_empty());
}

#[test]
fn unchanged_status_after_quiet_period_posts_silent_heartbeat() {
    let f = fixture();
    open_minor(&f);

    let later = t0() + Duration::minutes(120);
    let engine = IncidentEngine::new(&f.page, policy(60));
    let out = engine.run(&f.mapping, &report(ComponentStatus::DegradedPerformance, later), later);

    assert_eq!(out.updated.len(), 1);
    assert!(!out.updated[0].escalated);

    let calls = f.page.calls();
    let updates = incident_updates(&calls);
    assert_eq!(updates.len(), 1);
    let patch = updates[0];
    assert_eq!(patch.impact_override, None);
    assert!(!patch.deliver_notifications);
    assert!(patch.body.as_deref().unwrap_or_default().contains("continue to monitor"));
    assert_eq!(f.page.incidents()[0].impact, Impact::Minor);
}

#[test]
fn recovery_resolves_and_publishes_one_postmortem() {
    let f = fixture();
    let id = open_minor(&f);

    // An earlier heartbeat so the timeline has two entries.
    let mid = t0() + Duration::minutes(90);
    f.page.set_now(mid);
    IncidentEngine::new(&f.page, policy(60)).run(
        &f.mapping,
        &report(ComponentStatus::DegradedPerformance, mid),
        mid,
    );
    f.page.clear_calls();

    let later = t0() + Duration::minutes(180);
    f.page.set_now(later);
    let engine = IncidentEngine::new(&f.page, policy(60));
    let out = engine.run(&f.mapping, &report(ComponentStatus::Operational, later), later);

    assert_eq!(out.resolved.len(), 1);
    assert_eq!(out.resolved[0].incident_id, id);
    assert!(out.errors.is_empty());

    let calls = f.page.calls();
    let updates = incident_updates(&calls);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].status, Some(IncidentStatus::Resolved));
    assert_eq!(
        updates[0].components.get(&f.component_id),
        Some(&PageComponentStatus::Operational)
    );

    let pms = postmortems(&calls);
    assert_eq!(pms.len(), 1);
    let body = &pms[0].body;
    assert!(body.contains("**Component:** API"));
    assert!(!pms[0].notify_twitter);

    // Newest first: resolution, then the heartbeat, then the creation.
    let resolved = body.find("[resolved]").unwrap();
    let heartbeat = body.find("We continue to monitor").unwrap();
    let opened = body.find("[investigating]").unwrap();
    assert!(resolved < heartbeat && heartbeat < opened);

    assert_eq!(f.page.components()[0].status, PageComponentStatus::Operational);
    assert!(f.page.list_unresolved_incidents().unwrap().is_empty());
}

#[test]
fn postmortem_failure_keeps_resolution() {
    let f = fixture();
    open_minor(&f);
    f.page.fail(PageOp::CreatePostmortem);
    f.page.fail(PageOp::GetIncident);

    let engine = IncidentEngine::new(&f.page, policy(60));
    let out = engine.run(&f.mapping, &report(ComponentStatus::Operational, t0()), t0());

    assert_eq!(out.resolved.len(), 1);
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].kind, FailureKind::BestEffort);
    assert!(!out.has_errors());
    assert!(f.page.list_unresolved_incidents().unwrap().is_empty());
}

#[test]
fn postmortem_can_be_disabled() {
    let f = fixture();
    open_minor(&f);

    let p = IncidentPolicy {
        auto_postmortem: false,
        ..policy(60)
    };
    IncidentEngine::new(&f.page, p).run(&f.mapping, &report(ComponentStatus::Operational, t0()), t0());

    assert!(postmortems(&f.page.calls()).is_empty());
}

/// A scheduled maintenance on API, as the hosted page lists it.
fn seed_maintenance(f: &Fixture) {
    f.page.seed_incident(Incident {
        id: "maint-1".to_string(),
        name: "Database upgrade".to_string(),
        status: IncidentStatus::Other,
        impact: Impact::Maintenance,
        components: vec![AffectedComponent {
            id: f.component_id.clone(),
            name: "API".to_string(),
        }],
        incident_updates: Vec::new(),
        created_at: None,
    });
}

#[test]
fn maintenance_is_neither_escalated_nor_resolved() {
    let f = fixture();
    seed_maintenance(&f);
    let engine = IncidentEngine::new(&f.page, policy(60));

    let out = engine.run(&f.mapping, &report(ComponentStatus::Operational, t0()), t0());
    assert!(out.resolved.is_empty() && out.errors.is_empty());
    assert!(incident_updates(&f.page.calls()).is_empty());
    f.page.clear_calls();

    let out = engine.run(&f.mapping, &report(ComponentStatus::MajorOutage, t0()), t0());
    assert!(out.errors.is_empty());
    assert!(out.updated.is_empty());
    assert_eq!(out.created.len(), 1);
    let calls = f.page.calls();
    assert!(incident_updates(&calls).is_empty());
    assert_eq!(incident_creates(&calls)[0].impact_override, Some(Impact::Critical));
}

#[test]
fn maintenance_next_to_real_incident_leaves_maintenance_alone() {
    let f = fixture();
    seed_maintenance(&f);
    let id = open_minor(&f);

    let engine = IncidentEngine::new(&f.page, policy(60));
    let out = engine.run(&f.mapping, &report(ComponentStatus::MajorOutage, t0()), t0());

    assert!(out.errors.is_empty() && out.created.is_empty());
    assert_eq!(out.updated.len(), 1);
    let calls = f.page.calls();
    let touched: Vec<&str> = calls
        .iter()
        .filter_map(|c| match c {
            PageCall::UpdateIncident { id, .. } => Some(id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(touched, vec![id.as_str()]);
    assert_eq!(incident_updates(&calls)[0].impact_override, Some(Impact::Critical));

    let out = engine.run(&f.mapping, &report(ComponentStatus::Operational, t0()), t0());
    assert_eq!(out.resolved.len(), 1);
    assert_eq!(out.resolved[0].incident_id, id);
    let unresolved = f.page.list_unresolved_incidents().unwrap();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].id, "maint-1");
}

#[test]
fn unresolved_listing_failure_aborts_pass() {
    let f = fixture();
    f.page.fail(PageOp::ListUnresolvedIncidents);

    let engine = IncidentEngine::new(&f.page, policy(60));
    let out = engine.run(&f.mapping, &report(ComponentStatus::MajorOutage, t0()), t0());

    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].kind, FailureKind::Fatal);
    assert!(out.created.is_empty());
    assert!(f.page.calls().is_empty());
    assert!(out.has_errors());
}

#[test]
fn create_failure_is_isolated_per_component() {
    let page = InMemoryStatusPage::new();
    let api = page.seed_component("API", "");
    let web = page.seed_component("Website", "");
    let mut mapping = ComponentMapping::new();
    for (job, name, id) in [("api", "API", &api.id), ("web", "Website", &web.id)] {
        mapping.insert(
            job.to_string(),
            MappingEntry {
                name: name.to_string(),
                component_id: Some(id.clone()),
                metric_id: None,
            },
        );
    }
    let mut status = report(ComponentStatus::MajorOutage, t0());
    status.components.push(ComponentReport {
        name: "Website".to_string(),
        ..status.components[0].clone()
    });

    // The first create fails; the second component is still processed.
    page.fail(PageOp::CreateIncident);
    let out = IncidentEngine::new(&page, policy(60)).run(&mapping, &status, t0());
    assert_eq!(out.errors.len(), 2);
    assert!(out.errors.iter().all(|e| e.kind == FailureKind::Isolated));

    page.recover(PageOp::CreateIncident);
    let out = IncidentEngine::new(&page, policy(60)).run(&mapping, &status, t0());
    assert_eq!(out.created.len(), 2);
}

#[test]
fn automation_disabled_makes_no_calls() {
    let f = fixture();
    let p = IncidentPolicy {
        auto_create: false,
        ..policy(60)
    };
    let out = IncidentEngine::new(&f.page, p).run(&f.mapping, &report(ComponentStatus::MajorOutage, t0()), t0());
    assert_eq!(out, IncidentRunReport::default());
    assert!(f.page.calls().is_empty());
}

#[test]
fn unmapped_or_unreported_components_are_skipped() {
    let page = InMemoryStatusPage::new();
    let mapping = ComponentMapping::from([
        (
            "api".to_string(),
            MappingEntry {
                name: "API".to_string(),
                component_id: None,
                metric_id: None,
            },
        ),
        (
            "ghost".to_string(),
            MappingEntry {
                name: "Ghost".to_string(),
                component_id: Some("cmp-404".to_string()),
                metric_id: None,
            },
        ),
    ]);
    let out = IncidentEngine::new(&page, policy(60)).run(&mapping, &report(ComponentStatus::MajorOutage, t0()), t0());
    assert_eq!(out, IncidentRunReport::default());
    assert!(page.calls().is_empty());
}
