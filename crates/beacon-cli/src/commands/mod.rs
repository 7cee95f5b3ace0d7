pub mod manage;
pub mod monitor;
pub mod provision;
pub mod reconcile;
pub mod sync;

use std::process::ExitCode;

use anyhow::{Context, bail};

use beacon_metrics::{PrometheusClient, PrometheusConfig};
use beacon_statuspage::StatuspageClient;
use beacon_synthetic::{DEFAULT_API_URL, SyntheticConfig, SyntheticMonitoringClient};

/// Status-page credentials.
#[derive(clap::Args, Debug, Clone)]
pub struct StatuspageArgs {
    #[arg(long, env = "STATUSPAGE_API_KEY", hide_env_values = true)]
    pub statuspage_api_key: Option<String>,
}

impl StatuspageArgs {
    pub fn is_configured(&self) -> bool {
        self.statuspage_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn client(&self, page_id: &str) -> anyhow::Result<StatuspageClient> {
        let Some(key) = self.statuspage_api_key.as_deref().filter(|k| !k.is_empty()) else {
            bail!("STATUSPAGE_API_KEY is required");
        };
        if page_id.is_empty() {
            bail!("page_id is required in the mapping document");
        }
        Ok(StatuspageClient::new(key, page_id)?)
    }
}

/// Metric source credentials.
#[derive(clap::Args, Debug, Clone)]
pub struct PrometheusArgs {
    #[arg(long, env = "GRAFANA_PROMETHEUS_URL")]
    pub prometheus_url: String,
    #[arg(long, env = "GRAFANA_PROMETHEUS_USER_ID")]
    pub prometheus_user_id: String,
    #[arg(long, env = "GRAFANA_API_KEY", hide_env_values = true)]
    pub grafana_api_key: String,
}

impl PrometheusArgs {
    pub fn client(&self) -> anyhow::Result<PrometheusClient> {
        let config = PrometheusConfig::new(
            &self.prometheus_url,
            &self.prometheus_user_id,
            &self.grafana_api_key,
        );
        Ok(PrometheusClient::new(config)?)
    }
}

/// Synthetic-monitoring provisioning credentials.
#[derive(clap::Args, Debug, Clone)]
pub struct SyntheticArgs {
    #[arg(long, env = "GRAFANA_SM_URL", default_value = DEFAULT_API_URL)]
    pub sm_url: String,
    #[arg(long, env = "GRAFANA_SM_TOKEN", hide_env_values = true)]
    pub sm_token: Option<String>,
    #[arg(long, env = "GRAFANA_STACK_ID")]
    pub stack_id: Option<i64>,
    #[arg(long, env = "GRAFANA_METRICS_INSTANCE_ID")]
    pub metrics_instance_id: Option<i64>,
    #[arg(long, env = "GRAFANA_LOGS_INSTANCE_ID")]
    pub logs_instance_id: Option<i64>,
}

impl SyntheticArgs {
    pub fn is_configured(&self) -> bool {
        self.sm_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Build a client and register it with the provider.
    pub fn registered_client(&self) -> anyhow::Result<SyntheticMonitoringClient> {
        let Some(token) = self.sm_token.clone().filter(|t| !t.is_empty()) else {
            bail!("GRAFANA_SM_TOKEN is required");
        };
        let config = SyntheticConfig {
            api_url: self.sm_url.clone(),
            token,
            stack_id: self.stack_id.context("GRAFANA_STACK_ID is required")?,
            metrics_instance_id: self
                .metrics_instance_id
                .context("GRAFANA_METRICS_INSTANCE_ID is required")?,
            logs_instance_id: self
                .logs_instance_id
                .context("GRAFANA_LOGS_INSTANCE_ID is required")?,
        };
        let mut client = SyntheticMonitoringClient::new(config)?;
        client.register().context("registration failed")?;
        Ok(client)
    }
}

pub fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
