//! beacon.toml configuration parser.
//!
//! `beacon.toml` is the single declarative source of truth: which endpoints
//! should exist as monitoring checks and status-page components, and how
//! they are probed and judged.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{IncidentSettings, JobLabel, MonitorSettings, ThresholdOverrides};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeaconConfig {
    #[serde(default)]
    pub statuspage: StatuspageConfig,
    #[serde(default)]
    pub settings: MonitorSettings,
    #[serde(default)]
    pub incidents: IncidentSettings,
    #[serde(default)]
    pub endpoints: BTreeMap<JobLabel, EndpointConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatuspageConfig {
    #[serde(default)]
    pub page_id: String,
}

/// One desired endpoint, keyed by its job label in `[endpoints.<job_label>]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    /// Probe frequency in milliseconds.
    #[serde(default = "default_frequency")]
    pub frequency: u64,
    /// Probe timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Probe location ids.
    #[serde(default = "default_probes")]
    pub probes: Vec<i64>,
    /// Extra request headers, `"Name: value"`.
    #[serde(default)]
    pub headers: Vec<String>,
    /// Whether a status-page component should exist for this endpoint.
    #[serde(default = "default_true")]
    pub component: bool,
    /// Whether a latency metric should exist for this endpoint's component.
    #[serde(default = "default_true")]
    pub metric: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdOverrides>,
}

impl EndpointConfig {
    /// Display name of the endpoint's latency metric.
    pub fn metric_name(&self) -> String {
        format!("{} Latency", self.name)
    }
}

fn default_frequency() -> u64 {
    60_000
}

fn default_timeout() -> u64 {
    5_000
}

fn default_probes() -> Vec<i64> {
    vec![1, 2, 3]
}

fn default_true() -> bool {
    true
}

impl BeaconConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ConfigResult<Self> {
        let config: BeaconConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that would make name-based adoption ambiguous.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut names = HashSet::new();
        for (job_label, endpoint) in &self.endpoints {
            if endpoint.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "endpoint '{job_label}' has an empty name"
                )));
            }
            if !names.insert(endpoint.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "endpoint name '{}' is used more than once",
                    endpoint.name
                )));
            }
        }
        Ok(())
    }

    /// Job labels that should exist as status-page components.
    pub fn component_jobs(&self) -> impl Iterator<Item = (&JobLabel, &EndpointConfig)> {
        self.endpoints.iter().filter(|(_, e)| e.component)
    }
}
