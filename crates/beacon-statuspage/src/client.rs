//! The status-page API seam and its HTTP implementation.

use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::error::{StatusPageError, StatusPageResult};
use crate::types::*;

pub const DEFAULT_BASE_URL: &str = "https://api.statuspage.io/v1";

/// Operations Beacon needs from a status page.
///
/// Every call is a single blocking request; there is no retry.
pub trait StatusPageApi {
    fn list_components(&self) -> StatusPageResult<Vec<Component>>;
    fn create_component(&self, component: &NewComponent) -> StatusPageResult<Component>;
    fn update_component(&self, id: &str, patch: &ComponentPatch) -> StatusPageResult<Component>;
    fn delete_component(&self, id: &str) -> StatusPageResult<()>;

    fn list_metrics(&self) -> StatusPageResult<Vec<Metric>>;
    fn create_metric(&self, metric: &NewMetric) -> StatusPageResult<Metric>;
    fn delete_metric(&self, id: &str) -> StatusPageResult<()>;
    /// Submit one data point; `timestamp` is unix seconds.
    fn submit_metric_data(&self, id: &str, timestamp: i64, value: f64) -> StatusPageResult<()>;

    /// Everything not yet resolved, scheduled maintenances included.
    fn list_unresolved_incidents(&self) -> StatusPageResult<Vec<Incident>>;
    fn list_incidents(&self) -> StatusPageResult<Vec<Incident>>;
    fn get_incident(&self, id: &str) -> StatusPageResult<Incident>;
    fn create_incident(&self, incident: &NewIncident) -> StatusPageResult<Incident>;
    fn update_incident(&self, id: &str, patch: &IncidentPatch) -> StatusPageResult<Incident>;
    fn create_postmortem(&self, incident_id: &str, postmortem: &Postmortem)
    -> StatusPageResult<()>;
}

/// Blocking client for the hosted status-page REST API.
pub struct StatuspageClient {
    base_url: String,
    page_id: String,
    api_key: String,
    http: Client,
}

impl StatuspageClient {
    pub fn new(api_key: &str, page_id: &str) -> StatusPageResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, page_id)
    }

    pub fn with_base_url(base_url: &str, api_key: &str, page_id: &str) -> StatusPageResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StatusPageError::Request(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            page_id: page_id.to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/pages/{}/{path}", self.base_url, self.page_id)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "statuspage request");
        self.http
            .request(method, self.url(path))
            .header("Authorization", format!("OAuth {}", self.api_key))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> StatusPageResult<T> {
        decode(send(self.request(Method::GET, path))?)
    }

    fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> StatusPageResult<T> {
        decode(send(self.request(method, path).json(body))?)
    }

    fn delete(&self, path: &str) -> StatusPageResult<()> {
        send(self.request(Method::DELETE, path)).map(|_| ())
    }
}

fn send(request: RequestBuilder) -> StatusPageResult<reqwest::blocking::Response> {
    let response = request
        .send()
        .map_err(|e| StatusPageError::Request(e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(StatusPageError::NotFound(body));
    }
    Err(StatusPageError::Api {
        status: status.as_u16(),
        body,
    })
}

fn decode<T: DeserializeOwned>(response: reqwest::blocking::Response) -> StatusPageResult<T> {
    response
        .json()
        .map_err(|e| StatusPageError::Decode(e.to_string()))
}

impl StatusPageApi for StatuspageClient {
    fn list_components(&self) -> StatusPageResult<Vec<Component>> {
        self.get("components")
    }

    fn create_component(&self, component: &NewComponent) -> StatusPageResult<Component> {
        let body = json!({
            "component": {
                "name": component.name,
                "description": component.description,
                "status": component.status,
                "showcase": true,
                "only_show_if_degraded": false,
            }
        });
        self.send_json(Method::POST, "components", &body)
    }

    fn update_component(&self, id: &str, patch: &ComponentPatch) -> StatusPageResult<Component> {
        self.send_json(
            Method::PATCH,
            &format!("components/{id}"),
            &json!({ "component": patch }),
        )
    }

    fn delete_component(&self, id: &str) -> StatusPageResult<()> {
        self.delete(&format!("components/{id}"))
    }

    fn list_metrics(&self) -> StatusPageResult<Vec<Metric>> {
        self.get("metrics")
    }

    fn create_metric(&self, metric: &NewMetric) -> StatusPageResult<Metric> {
        let body = json!({
            "metric": {
                "name": metric.name,
                "display": true,
                "suffix": metric.suffix,
                "y_axis_min": 0,
                "decimal_places": 0,
                "tooltip_description": metric.tooltip_description,
            }
        });
        self.send_json(Method::POST, "metrics", &body)
    }

    fn delete_metric(&self, id: &str) -> StatusPageResult<()> {
        self.delete(&format!("metrics/{id}"))
    }

    fn submit_metric_data(&self, id: &str, timestamp: i64, value: f64) -> StatusPageResult<()> {
        let body = json!({ "data": { "timestamp": timestamp, "value": value } });
        send(
            self.request(Method::POST, &format!("metrics/{id}/data.json"))
                .json(&body),
        )
        .map(|_| ())
    }

    fn list_unresolved_incidents(&self) -> StatusPageResult<Vec<Incident>> {
        self.get("incidents/unresolved")
    }

    fn list_incidents(&self) -> StatusPageResult<Vec<Incident>> {
        self.get("incidents")
    }

    fn get_incident(&self, id: &str) -> StatusPageResult<Incident> {
        self.get(&format!("incidents/{id}"))
    }

    fn create_incident(&self, incident: &NewIncident) -> StatusPageResult<Incident> {
        self.send_json(Method::POST, "incidents", &json!({ "incident": incident }))
    }

    fn update_incident(&self, id: &str, patch: &IncidentPatch) -> StatusPageResult<Incident> {
        self.send_json(
            Method::PATCH,
            &format!("incidents/{id}"),
            &json!({ "incident": patch }),
        )
    }

    fn create_postmortem(
        &self,
        incident_id: &str,
        postmortem: &Postmortem,
    ) -> StatusPageResult<()> {
        send(
            self.request(Method::PUT, &format!("incidents/{incident_id}/postmortem"))
                .json(&json!({ "postmortem": postmortem })),
        )
        .map(|_| ())
    }
}
