//! beacon-metrics: the metric source behind status classification.
//!
//! A [`MetricSource`] answers one question per check: over the trailing
//! windows, what fraction of probes succeeded and how long did they take?
//! Either answer may be absent when the backend has no data.
//!
//! [`PrometheusClient`] implements it against a Prometheus-compatible
//! instant-query endpoint fed by synthetic probes (`probe_success`,
//! `probe_duration_seconds`).

pub mod prometheus;

use thiserror::Error;

use beacon_core::QueryWindows;

pub use prometheus::{PrometheusClient, PrometheusConfig};

pub type MetricsResult<T> = Result<T, MetricsError>;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

/// Reachability (percent) and latency (milliseconds) for one check.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricSample {
    pub reachability: Option<f64>,
    pub latency_ms: Option<f64>,
}

impl MetricSample {
    pub fn new(reachability: Option<f64>, latency_ms: Option<f64>) -> Self {
        Self {
            reachability,
            latency_ms,
        }
    }

    /// A sample with no data at all.
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Source of per-check health metrics.
pub trait MetricSource {
    /// Fetch both metrics for `job_label` over `windows`.
    ///
    /// Missing data yields `None` fields; `Err` is reserved for transport or
    /// backend failures.
    fn fetch(&self, job_label: &str, windows: &QueryWindows) -> MetricsResult<MetricSample>;
}
