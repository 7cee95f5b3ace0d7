//! Domain types shared across Beacon crates.
//!
//! Status documents (`status.json`), the status-source document
//! (`checks.json`), and the mapping document (`statuspage.json`) are all
//! defined here with their required and optional fields spelled out, so the
//! rest of the workspace operates on strict types instead of loose JSON.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable key of a monitored endpoint (the monitoring job name).
pub type JobLabel = String;

// ── Component status ──────────────────────────────────────────────

/// Three-level health of a component.
///
/// Variants are declared best-first so the derived `Ord` is the severity
/// order: `Operational < DegradedPerformance < MajorOutage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Operational,
    DegradedPerformance,
    MajorOutage,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Operational => "operational",
            ComponentStatus::DegradedPerformance => "degraded_performance",
            ComponentStatus::MajorOutage => "major_outage",
        }
    }

    pub fn is_healthy(&self) -> bool {
        *self == ComponentStatus::Operational
    }

    /// The more severe of two statuses.
    pub fn worst(self, other: ComponentStatus) -> ComponentStatus {
        self.max(other)
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Thresholds ────────────────────────────────────────────────────

/// Cutoffs used to classify a metric sample.
///
/// Reachability is a percentage (higher is better); latency is in
/// milliseconds (lower is better). Both tiers are inclusive on the good side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub reachability_operational: f64,
    pub reachability_degraded: f64,
    pub latency_operational_ms: f64,
    pub latency_degraded_ms: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            reachability_operational: 95.0,
            reachability_degraded: 75.0,
            latency_operational_ms: 200.0,
            latency_degraded_ms: 1000.0,
        }
    }
}

impl Thresholds {
    /// Apply the fields present in `overrides`; absent fields keep `self`.
    pub fn with_overrides(self, overrides: &ThresholdOverrides) -> Self {
        Self {
            reachability_operational: overrides
                .reachability
                .operational
                .unwrap_or(self.reachability_operational),
            reachability_degraded: overrides
                .reachability
                .degraded
                .unwrap_or(self.reachability_degraded),
            latency_operational_ms: overrides
                .latency_ms
                .operational
                .unwrap_or(self.latency_operational_ms),
            latency_degraded_ms: overrides
                .latency_ms
                .degraded
                .unwrap_or(self.latency_degraded_ms),
        }
    }
}

/// Document shape of a threshold block:
/// `{reachability: {operational, degraded}, latency_ms: {operational, degraded}}`.
///
/// Every field is optional. Used both for the global settings block and for
/// per-check overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    #[serde(default, skip_serializing_if = "TierCutoffs::is_empty")]
    pub reachability: TierCutoffs,
    #[serde(default, skip_serializing_if = "TierCutoffs::is_empty")]
    pub latency_ms: TierCutoffs,
}

impl ThresholdOverrides {
    pub fn is_empty(&self) -> bool {
        self.reachability.is_empty() && self.latency_ms.is_empty()
    }
}

impl From<Thresholds> for ThresholdOverrides {
    fn from(t: Thresholds) -> Self {
        Self {
            reachability: TierCutoffs {
                operational: Some(t.reachability_operational),
                degraded: Some(t.reachability_degraded),
            },
            latency_ms: TierCutoffs {
                operational: Some(t.latency_operational_ms),
                degraded: Some(t.latency_degraded_ms),
            },
        }
    }
}

/// Operational/degraded cutoffs for one metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierCutoffs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operational: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<f64>,
}

impl TierCutoffs {
    pub fn is_empty(&self) -> bool {
        self.operational.is_none() && self.degraded.is_none()
    }
}

// ── Status source (checks.json) ───────────────────────────────────

/// Trailing windows for the two metric queries (PromQL durations).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindows {
    pub reachability: String,
    pub latency: String,
}

impl Default for QueryWindows {
    fn default() -> Self {
        Self {
            reachability: default_reachability_window(),
            latency: default_latency_window(),
        }
    }
}

/// Global monitoring settings shared by every check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    #[serde(default = "default_reachability_window")]
    pub reachability_query_window: String,
    #[serde(default = "default_latency_window")]
    pub latency_query_window: String,
    #[serde(default = "default_threshold_block")]
    pub thresholds: ThresholdOverrides,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            reachability_query_window: default_reachability_window(),
            latency_query_window: default_latency_window(),
            thresholds: default_threshold_block(),
        }
    }
}

impl MonitorSettings {
    /// Global thresholds: built-in defaults with the settings block applied.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::default().with_overrides(&self.thresholds)
    }

    pub fn windows(&self) -> QueryWindows {
        QueryWindows {
            reachability: self.reachability_query_window.clone(),
            latency: self.latency_query_window.clone(),
        }
    }
}

fn default_reachability_window() -> String {
    "15m".to_string()
}

fn default_latency_window() -> String {
    "5m".to_string()
}

fn default_threshold_block() -> ThresholdOverrides {
    Thresholds::default().into()
}

/// A logical monitored entity as listed in `checks.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    pub job_label: JobLabel,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdOverrides>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
}

impl Check {
    /// Thresholds for this check: `global` with the check's overrides applied.
    pub fn effective_thresholds(&self, global: Thresholds) -> Thresholds {
        match &self.thresholds {
            Some(overrides) => global.with_overrides(overrides),
            None => global,
        }
    }
}

/// The status-source input document (`checks.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSource {
    #[serde(default)]
    pub settings: MonitorSettings,
    #[serde(default)]
    pub checks: Vec<Check>,
}

// ── Status report (status.json) ───────────────────────────────────

/// Snapshot of the observed state of every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub last_updated: DateTime<Utc>,
    pub overall_status: ComponentStatus,
    pub components: Vec<ComponentReport>,
}

/// One component's entry in a [`StatusReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentReport {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: ComponentStatus,
    pub reachability: Option<f64>,
    pub latency_ms: Option<f64>,
    pub last_checked: DateTime<Utc>,
}

impl StatusReport {
    /// Find a component entry by display name.
    pub fn component(&self, name: &str) -> Option<&ComponentReport> {
        self.components.iter().find(|c| c.name == name)
    }
}

// ── Mapping document (statuspage.json) ────────────────────────────

/// Remote identifiers associated with one job label.
///
/// Absent ids are written as empty strings to keep the document shape
/// stable; in memory they are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub name: String,
    #[serde(default, with = "blank_as_none")]
    pub component_id: Option<String>,
    #[serde(default, with = "blank_as_none")]
    pub metric_id: Option<String>,
}

/// Incident automation policy stored alongside the mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentSettings {
    #[serde(default = "default_true")]
    pub auto_create: bool,
    #[serde(default = "default_true")]
    pub auto_postmortem: bool,
    #[serde(default = "default_true")]
    pub notify_subscribers: bool,
    #[serde(default = "default_quiet_period")]
    pub quiet_period_minutes: u32,
}

impl Default for IncidentSettings {
    fn default() -> Self {
        Self {
            auto_create: true,
            auto_postmortem: true,
            notify_subscribers: true,
            quiet_period_minutes: default_quiet_period(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_quiet_period() -> u32 {
    60
}

/// Component → job label mapping plus incident policy.
pub type ComponentMapping = BTreeMap<JobLabel, MappingEntry>;

/// The mapping document (`statuspage.json`), owned by reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDocument {
    #[serde(default)]
    pub page_id: String,
    #[serde(default)]
    pub component_mapping: ComponentMapping,
    #[serde(default)]
    pub incidents: IncidentSettings,
}

/// `""` and `null` deserialize to `None`; `None` serializes to `""`.
mod blank_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.filter(|s| !s.trim().is_empty()))
    }
}
