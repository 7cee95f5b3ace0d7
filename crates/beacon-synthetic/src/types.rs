//! Synthetic-monitoring records.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A check as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticCheck {
    pub id: i64,
    #[serde(default)]
    pub tenant_id: i64,
    pub job: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub frequency: u64,
    #[serde(default)]
    pub timeout: u64,
    #[serde(default)]
    pub probes: Vec<i64>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub settings: Value,
}

impl SyntheticCheck {
    pub fn sorted_probes(&self) -> Vec<i64> {
        let mut p = self.probes.clone();
        p.sort_unstable();
        p
    }
}

/// Desired shape of an HTTP check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSpec {
    pub job: String,
    pub target: String,
    /// Milliseconds between probes.
    pub frequency: u64,
    /// Milliseconds.
    pub timeout: u64,
    pub probes: Vec<i64>,
    /// `"Name: value"` request headers.
    pub headers: Vec<String>,
}

impl CheckSpec {
    pub fn sorted_probes(&self) -> Vec<i64> {
        let mut p = self.probes.clone();
        p.sort_unstable();
        p
    }

    /// Whether `existing` differs in target, frequency, or probe set.
    pub fn differs_from(&self, existing: &SyntheticCheck) -> bool {
        self.target != existing.target
            || self.frequency != existing.frequency
            || self.sorted_probes() != existing.sorted_probes()
    }

    /// Provider settings block: a GET expecting HTTP 200.
    pub fn settings(&self) -> Value {
        let mut http = json!({ "method": "GET", "validStatusCodes": [200] });
        if !self.headers.is_empty() {
            http["headers"] = json!(self.headers);
        }
        json!({ "http": http })
    }
}

/// A probe location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub online: bool,
}

/// Credentials obtained from `register`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub access_token: String,
    pub tenant_id: i64,
}
