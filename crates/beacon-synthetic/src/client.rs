//! The monitoring-provider seam and its HTTP implementation.

use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{SyntheticError, SyntheticResult};
use crate::types::{CheckSpec, Probe, Registration, SyntheticCheck};

pub const DEFAULT_API_URL: &str = "https://synthetic-monitoring-api-us-east-0.grafana.net";

/// Check and probe operations on a registered tenant.
pub trait SyntheticApi {
    fn list_checks(&self) -> SyntheticResult<Vec<SyntheticCheck>>;
    fn add_check(&self, spec: &CheckSpec) -> SyntheticResult<SyntheticCheck>;
    fn update_check(&self, id: i64, spec: &CheckSpec) -> SyntheticResult<SyntheticCheck>;
    fn delete_check(&self, id: i64) -> SyntheticResult<()>;
    fn list_probes(&self) -> SyntheticResult<Vec<Probe>>;
}

/// Stack identifiers and the provisioning token used to register.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub api_url: String,
    pub token: String,
    pub stack_id: i64,
    pub metrics_instance_id: i64,
    pub logs_instance_id: i64,
}

/// Blocking client for the synthetic-monitoring API.
///
/// [`register`](Self::register) must succeed before any [`SyntheticApi`]
/// call; until then they fail with [`SyntheticError::NotRegistered`].
pub struct SyntheticMonitoringClient {
    config: SyntheticConfig,
    http: Client,
    registration: Option<Registration>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstallResponse {
    access_token: Option<String>,
    tenant_info: Option<TenantInfo>,
}

#[derive(Deserialize)]
struct TenantInfo {
    id: i64,
}

impl SyntheticMonitoringClient {
    pub fn new(config: SyntheticConfig) -> SyntheticResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SyntheticError::Request(e.to_string()))?;
        Ok(Self {
            config,
            http,
            registration: None,
        })
    }

    /// Exchange the provisioning token for a tenant access token.
    pub fn register(&mut self) -> SyntheticResult<Registration> {
        let body = json!({
            "stackId": self.config.stack_id,
            "metricsInstanceId": self.config.metrics_instance_id,
            "logsInstanceId": self.config.logs_instance_id,
        });
        let response = send(
            self.http
                .post(self.url("register/install"))
                .bearer_auth(&self.config.token)
                .json(&body),
        )
        .map_err(|e| SyntheticError::Registration(e.to_string()))?;
        let install: InstallResponse = decode(response)?;

        let access_token = install
            .access_token
            .ok_or_else(|| SyntheticError::Registration("no access token in response".into()))?;
        let tenant_id = install
            .tenant_info
            .map(|t| t.id)
            .ok_or_else(|| SyntheticError::Registration("no tenant info in response".into()))?;

        info!(tenant_id, "registered with synthetic monitoring");
        let registration = Registration {
            access_token,
            tenant_id,
        };
        self.registration = Some(registration.clone());
        Ok(registration)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{path}", self.config.api_url.trim_end_matches('/'))
    }

    fn registered(&self) -> SyntheticResult<&Registration> {
        self.registration.as_ref().ok_or(SyntheticError::NotRegistered)
    }

    fn request(&self, method: Method, path: &str) -> SyntheticResult<RequestBuilder> {
        let reg = self.registered()?;
        debug!(%method, path, "synthetic monitoring request");
        Ok(self
            .http
            .request(method, self.url(path))
            .bearer_auth(&reg.access_token))
    }

    fn check_body(&self, spec: &CheckSpec, id: Option<i64>) -> SyntheticResult<Value> {
        let reg = self.registered()?;
        let mut body = json!({
            "tenantId": reg.tenant_id,
            "job": spec.job,
            "target": spec.target,
            "probes": spec.probes,
            "frequency": spec.frequency,
            "timeout": spec.timeout,
            "enabled": true,
            "settings": spec.settings(),
        });
        if let Some(id) = id {
            body["id"] = json!(id);
        }
        Ok(body)
    }
}

fn send(request: RequestBuilder) -> SyntheticResult<Response> {
    let response = request
        .send()
        .map_err(|e| SyntheticError::Request(e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(SyntheticError::Api {
        status: status.as_u16(),
        body: response.text().unwrap_or_default(),
    })
}

fn decode<T: DeserializeOwned>(response: Response) -> SyntheticResult<T> {
    response
        .json()
        .map_err(|e| SyntheticError::Decode(e.to_string()))
}

impl SyntheticApi for SyntheticMonitoringClient {
    fn list_checks(&self) -> SyntheticResult<Vec<SyntheticCheck>> {
        decode(send(self.request(Method::GET, "check/list")?)?)
    }

    fn add_check(&self, spec: &CheckSpec) -> SyntheticResult<SyntheticCheck> {
        let body = self.check_body(spec, None)?;
        decode(send(self.request(Method::POST, "check/add")?.json(&body))?)
    }

    fn update_check(&self, id: i64, spec: &CheckSpec) -> SyntheticResult<SyntheticCheck> {
        let body = self.check_body(spec, Some(id))?;
        decode(send(self.request(Method::POST, "check/update")?.json(&body))?)
    }

    fn delete_check(&self, id: i64) -> SyntheticResult<()> {
        send(self.request(Method::DELETE, &format!("check/delete/{id}"))?).map(|_| ())
    }

    fn list_probes(&self) -> SyntheticResult<Vec<Probe>> {
        decode(send(self.request(Method::GET, "probe/list")?)?)
    }
}
