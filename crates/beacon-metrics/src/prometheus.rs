//! Prometheus instant-query client.
//!
//! Reachability is `avg_over_time(probe_success)` scaled to a percentage;
//! latency is `avg_over_time(probe_duration_seconds)` scaled to
//! milliseconds. Wide windows smooth single failed probes without keeping
//! any state between runs.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use beacon_core::QueryWindows;

use crate::{MetricSample, MetricSource, MetricsError, MetricsResult};

/// Connection settings for the Prometheus query endpoint.
#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    /// Full instant-query URL (`.../api/prom/api/v1/query`).
    pub query_url: String,
    /// Basic-auth user (the hosted instance id).
    pub user_id: String,
    /// Basic-auth password (API key).
    pub api_key: String,
    pub timeout: Duration,
}

impl PrometheusConfig {
    pub fn new(query_url: &str, user_id: &str, api_key: &str) -> Self {
        Self {
            query_url: query_url.to_string(),
            user_id: user_id.to_string(),
            api_key: api_key.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Blocking client for a Prometheus-compatible query API.
pub struct PrometheusClient {
    config: PrometheusConfig,
    http: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<InstantSample>,
}

#[derive(Debug, Deserialize)]
struct InstantSample {
    /// `[<unix time>, "<value>"]`
    #[serde(default)]
    value: Vec<Value>,
}

impl PrometheusClient {
    pub fn new(config: PrometheusConfig) -> MetricsResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MetricsError::Request(e.to_string()))?;
        Ok(Self { config, http })
    }

    /// Execute an instant query and return the first sample's value.
    ///
    /// `Ok(None)` means the query succeeded but returned no usable sample.
    pub fn query_scalar(&self, promql: &str) -> MetricsResult<Option<f64>> {
        let response = self
            .http
            .get(&self.config.query_url)
            .query(&[("query", promql)])
            .basic_auth(&self.config.user_id, Some(&self.config.api_key))
            .send()
            .map_err(|e| MetricsError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetricsError::Request(format!("HTTP {status}")));
        }

        let body: QueryResponse = response
            .json()
            .map_err(|e| MetricsError::Decode(e.to_string()))?;
        first_sample_value(body)
    }

    /// Probe success rate over `window`, as a percentage (0–100).
    pub fn fetch_reachability(&self, job_label: &str, window: &str) -> MetricsResult<Option<f64>> {
        let value = self.query_scalar(&reachability_query(job_label, window))?;
        if value.is_none() {
            warn!(%job_label, "no reachability data");
        }
        Ok(value.map(|v| v * 100.0))
    }

    /// Mean probe duration over `window`, in milliseconds.
    pub fn fetch_latency(&self, job_label: &str, window: &str) -> MetricsResult<Option<f64>> {
        let value = self.query_scalar(&latency_query(job_label, window))?;
        if value.is_none() {
            warn!(%job_label, "no latency data");
        }
        Ok(value.map(|v| v * 1000.0))
    }
}

impl MetricSource for PrometheusClient {
    fn fetch(&self, job_label: &str, windows: &QueryWindows) -> MetricsResult<MetricSample> {
        let reachability = self.fetch_reachability(job_label, &windows.reachability)?;
        let latency_ms = self.fetch_latency(job_label, &windows.latency)?;
        debug!(%job_label, ?reachability, ?latency_ms, "metrics fetched");
        Ok(MetricSample::new(reachability, latency_ms))
    }
}

pub fn reachability_query(job_label: &str, window: &str) -> String {
    format!(
        "avg_over_time(probe_success{{job=\"{}\"}}[{window}])",
        escape_label(job_label)
    )
}

pub fn latency_query(job_label: &str, window: &str) -> String {
    format!(
        "avg_over_time(probe_duration_seconds{{job=\"{}\"}}[{window}])",
        escape_label(job_label)
    )
}

fn escape_label(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Extract the first sample of a successful response.
///
/// A non-success status is an error; an empty or unparsable result is `None`.
fn first_sample_value(body: QueryResponse) -> MetricsResult<Option<f64>> {
    if body.status != "success" {
        return Err(MetricsError::Query(
            body.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    let Some(sample) = body.data.and_then(|d| d.result.into_iter().next()) else {
        return Ok(None);
    };

    let parsed = match sample.value.get(1) {
        Some(Value::String(s)) => s.parse::<f64>().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };
    if parsed.is_none() {
        warn!(value = ?sample.value, "unparsable sample value");
    }
    Ok(parsed.filter(|v| v.is_finite()))
}
