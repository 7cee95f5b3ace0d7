//! Status-page records and request payloads.
//!
//! Response records are lenient about optional fields (the API returns
//! `null` for many of them); request payloads only serialize what is set.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use beacon_core::ComponentStatus;

/// Component status as the status page knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageComponentStatus {
    Operational,
    DegradedPerformance,
    PartialOutage,
    MajorOutage,
    UnderMaintenance,
}

impl PageComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageComponentStatus::Operational => "operational",
            PageComponentStatus::DegradedPerformance => "degraded_performance",
            PageComponentStatus::PartialOutage => "partial_outage",
            PageComponentStatus::MajorOutage => "major_outage",
            PageComponentStatus::UnderMaintenance => "under_maintenance",
        }
    }
}

impl From<ComponentStatus> for PageComponentStatus {
    fn from(status: ComponentStatus) -> Self {
        match status {
            ComponentStatus::Operational => PageComponentStatus::Operational,
            ComponentStatus::DegradedPerformance => PageComponentStatus::DegradedPerformance,
            ComponentStatus::MajorOutage => PageComponentStatus::MajorOutage,
        }
    }
}

impl fmt::Display for PageComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Investigating,
    Identified,
    Monitoring,
    Resolved,
    Postmortem,
    /// Scheduled-maintenance statuses and anything newer.
    #[serde(other)]
    Other,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Identified => "identified",
            IncidentStatus::Monitoring => "monitoring",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Postmortem => "postmortem",
            IncidentStatus::Other => "other",
        }
    }

    /// Whether the incident is still being worked on.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            IncidentStatus::Investigating | IncidentStatus::Identified | IncidentStatus::Monitoring
        )
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incident impact. The first four are ordered by severity; the rest sort
/// after them and are never derived from a component status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    None,
    Minor,
    Major,
    Critical,
    /// Scheduled maintenances.
    Maintenance,
    #[serde(other)]
    Other,
}

impl Impact {
    /// Impact declared for an incident opened at `status`.
    pub fn for_status(status: ComponentStatus) -> Impact {
        match status {
            ComponentStatus::Operational => Impact::None,
            ComponentStatus::DegradedPerformance => Impact::Minor,
            ComponentStatus::MajorOutage => Impact::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::None => "none",
            Impact::Minor => "minor",
            Impact::Major => "major",
            Impact::Critical => "critical",
            Impact::Maintenance => "maintenance",
            Impact::Other => "other",
        }
    }

    /// Whether moving from `previous` to `self` is a worsening. Impacts
    /// off the severity scale rank with `None`.
    pub fn worsens(self, previous: Impact) -> bool {
        self.rank() > previous.rank()
    }

    fn rank(self) -> u8 {
        match self {
            Impact::None | Impact::Maintenance | Impact::Other => 0,
            Impact::Minor => 1,
            Impact::Major => 2,
            Impact::Critical => 3,
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Records ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub status: PageComponentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suffix: String,
}

/// A component reference inside an incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedComponent {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

/// One entry of an incident's update history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    /// Free-form: the API also uses values such as `postmortem` here.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    pub status: IncidentStatus,
    #[serde(default = "default_impact", deserialize_with = "impact_or_minor")]
    pub impact: Impact,
    #[serde(default)]
    pub components: Vec<AffectedComponent>,
    #[serde(default)]
    pub incident_updates: Vec<IncidentUpdate>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Incident {
    pub fn affects(&self, component_id: &str) -> bool {
        self.components.iter().any(|c| c.id == component_id)
    }

    /// Time of the most recent update with a parseable timestamp.
    pub fn last_update_time(&self) -> Option<DateTime<Utc>> {
        self.incident_updates
            .iter()
            .filter_map(|u| u.created_at.as_deref().and_then(parse_timestamp))
            .max()
    }
}

fn default_impact() -> Impact {
    Impact::Minor
}

fn impact_or_minor<'de, D: Deserializer<'de>>(d: D) -> Result<Impact, D::Error> {
    Ok(Option::<Impact>::deserialize(d)?.unwrap_or(Impact::Minor))
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Parse an API timestamp (RFC 3339, `Z` or offset).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ── Request payloads ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewComponent {
    pub name: String,
    pub description: String,
    pub status: PageComponentStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PageComponentStatus>,
}

impl ComponentPatch {
    pub fn status(status: PageComponentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMetric {
    pub name: String,
    pub suffix: String,
    pub tooltip_description: String,
}

impl NewMetric {
    /// A millisecond latency metric.
    pub fn latency(name: &str, component_name: &str) -> Self {
        Self {
            name: name.to_string(),
            suffix: "ms".to_string(),
            tooltip_description: format!("Average response time for {component_name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewIncident {
    pub name: String,
    pub status: IncidentStatus,
    pub body: String,
    pub component_ids: Vec<String>,
    pub components: BTreeMap<String, PageComponentStatus>,
    pub deliver_notifications: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_override: Option<Impact>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IncidentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, PageComponentStatus>,
    pub deliver_notifications: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_override: Option<Impact>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Postmortem {
    pub body: String,
    pub notify_subscribers: bool,
    pub notify_twitter: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_follows_severity() {
        assert_eq!(Impact::for_status(ComponentStatus::DegradedPerformance), Impact::Minor);
        assert_eq!(Impact::for_status(ComponentStatus::MajorOutage), Impact::Critical);
        assert!(Impact::Critical > Impact::Minor);
    }

    #[test]
    fn incident_tolerates_nulls() {
        let raw = r#"{
            "id": "inc1",
            "name": null,
            "status": "investigating",
            "impact": null,
            "components": [{"id": "c1", "name": null}],
            "incident_updates": [{"status": "investigating", "body": null, "created_at": null}]
        }"#;
        let incident: Incident = serde_json::from_str(raw).unwrap();
        assert_eq!(incident.impact, Impact::Minor);
        assert!(incident.affects("c1"));
        assert!(!incident.affects("c2"));
        assert_eq!(incident.incident_updates[0].body, "");
        assert_eq!(incident.last_update_time(), None);
    }

    #[test]
    fn worsening_follows_severity() {
        assert!(Impact::Critical.worsens(Impact::Minor));
        assert!(!Impact::Minor.worsens(Impact::Critical));
        assert!(!Impact::Minor.worsens(Impact::Minor));
        assert!(Impact::Minor.worsens(Impact::Other));
        assert!(!Impact::Maintenance.worsens(Impact::None));
    }

    #[test]
    fn maintenance_does_not_break_a_listing() {
        let raw = r#"[
            {"id": "inc1", "status": "investigating", "impact": "critical"},
            {"id": "mnt1", "status": "in_progress", "impact": "maintenance"},
            {"id": "mnt2", "status": "scheduled", "impact": "something_new"}
        ]"#;
        let incidents: Vec<Incident> = serde_json::from_str(raw).unwrap();
        assert_eq!(incidents[0].impact, Impact::Critical);
        assert_eq!(incidents[1].impact, Impact::Maintenance);
        assert_eq!(incidents[1].status, IncidentStatus::Other);
        assert_eq!(incidents[2].impact, Impact::Other);
        assert!(incidents[0].status.is_open());
        assert!(!incidents[1].status.is_open());
    }

    #[test]
    fn unknown_incident_status_is_other() {
        let status: IncidentStatus = serde_json::from_str(r#""in_progress""#).unwrap();
        assert_eq!(status, IncidentStatus::Other);
        assert!(!status.is_open());
        let status: IncidentStatus = serde_json::from_str(r#""postmortem""#).unwrap();
        assert_eq!(status, IncidentStatus::Postmortem);
        assert!(IncidentStatus::Monitoring.is_open());
    }

    #[test]
    fn last_update_is_latest_parseable() {
        let incident: Incident = serde_json::from_str(
            r#"{
                "id": "inc1",
                "status": "identified",
                "incident_updates": [
                    {"status": "identified", "created_at": "2026-01-01T10:00:00.000Z"},
                    {"status": "investigating", "created_at": "garbage"},
                    {"status": "identified", "created_at": "2026-01-01T12:30:00+02:00"}
                ]
            }"#,
        )
        .unwrap();
        let expected = parse_timestamp("2026-01-01T10:30:00Z");
        assert_eq!(incident.last_update_time(), expected);
    }

    #[test]
    fn patch_omits_unset_fields() {
        let patch = IncidentPatch {
            status: Some(IncidentStatus::Resolved),
            ..IncidentPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "resolved", "deliver_notifications": false})
        );
    }
}
