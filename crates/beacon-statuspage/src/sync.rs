//! Component status and latency sync.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use beacon_core::{ComponentMapping, Failure, StatusReport};

use crate::client::StatusPageApi;
use crate::types::{ComponentPatch, PageComponentStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    /// Components whose status was pushed.
    pub updated: Vec<String>,
    /// Mapping entries with no status data in the report.
    pub skipped: Vec<String>,
    pub metrics_submitted: usize,
    pub errors: Vec<Failure>,
}

impl SyncReport {
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(Failure::is_error)
    }
}

/// Push every mapped component's status, and its latency when it has a
/// metric, to the status page.
pub fn sync_components<A: StatusPageApi + ?Sized>(
    api: &A,
    mapping: &ComponentMapping,
    report: &StatusReport,
    now: DateTime<Utc>,
) -> SyncReport {
    let mut out = SyncReport::default();

    for (job_label, entry) in mapping {
        let name = if entry.name.is_empty() {
            job_label.as_str()
        } else {
            entry.name.as_str()
        };
        let Some(observed) = report.component(name) else {
            warn!(component = %name, "no status data, skipping");
            out.skipped.push(name.to_string());
            continue;
        };

        if let Some(component_id) = entry.component_id.as_deref() {
            let status = PageComponentStatus::from(observed.status);
            match api.update_component(component_id, &ComponentPatch::status(status)) {
                Ok(_) => {
                    info!(component = %name, %status, "component status pushed");
                    out.updated.push(name.to_string());
                }
                Err(e) => {
                    error!(component = %name, error = %e, "component status update failed");
                    out.errors.push(Failure::isolated(name, e));
                }
            }
        }

        if let (Some(metric_id), Some(latency)) = (entry.metric_id.as_deref(), observed.latency_ms) {
            match api.submit_metric_data(metric_id, now.timestamp(), latency) {
                Ok(()) => {
                    debug!(component = %name, latency_ms = latency, "latency submitted");
                    out.metrics_submitted += 1;
                }
                Err(e) => {
                    warn!(component = %name, error = %e, "latency submission failed");
                    out.errors
                        .push(Failure::best_effort(format!("{name} latency"), e));
                }
            }
        }
    }

    info!(
        updated = out.updated.len(),
        failed = out.errors.iter().filter(|f| f.is_error()).count(),
        "component sync complete"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryStatusPage, PageCall, PageOp};
    use beacon_core::{ComponentReport, ComponentStatus, MappingEntry};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 6, 0, 0).unwrap()
    }

    fn report(entries: &[(&str, ComponentStatus, Option<f64>)]) -> StatusReport {
        StatusReport {
            last_updated: now(),
            overall_status: ComponentStatus::Operational,
            components: entries
                .iter()
                .map(|(name, status, latency)| ComponentReport {
                    name: name.to_string(),
                    description: String::new(),
                    status: *status,
                    reachability: Some(100.0),
                    latency_ms: *latency,
                    last_checked: now(),
                })
                .collect(),
        }
    }

    fn entry(name: &str, component_id: &str, metric_id: Option<&str>) -> MappingEntry {
        MappingEntry {
            name: name.to_string(),
            component_id: Some(component_id.to_string()),
            metric_id: metric_id.map(str::to_string),
        }
    }

    #[test]
    fn pushes_status_and_latency() {
        let page = InMemoryStatusPage::new();
        let c = page.seed_component("API", "");
        let m = page.seed_metric("API Latency");
        let mapping = ComponentMapping::from([("api".to_string(), entry("API", &c.id, Some(&m.id)))]);

        let out = sync_components(
            &page,
            &mapping,
            &report(&[("API", ComponentStatus::DegradedPerformance, Some(321.5))]),
            now(),
        );

        assert_eq!(out.updated, vec!["API"]);
        assert_eq!(out.metrics_submitted, 1);
        assert!(!out.has_errors());
        assert_eq!(page.components()[0].status, PageComponentStatus::DegradedPerformance);
        assert!(page.calls().contains(&PageCall::SubmitMetricData {
            id: m.id.clone(),
            timestamp: now().timestamp(),
            value: 321.5,
        }));
    }

    #[test]
    fn missing_report_entry_is_skipped() {
        let page = InMemoryStatusPage::new();
        let mapping = ComponentMapping::from([("web".to_string(), entry("Website", "c9", None))]);

        let out = sync_components(&page, &mapping, &report(&[]), now());

        assert_eq!(out.skipped, vec!["Website"]);
        assert!(page.calls().is_empty());
    }

    #[test]
    fn component_failure_is_isolated_and_metric_failure_best_effort() {
        let page = InMemoryStatusPage::new();
        let a = page.seed_component("API", "");
        let w = page.seed_component("Website", "");
        let mapping = ComponentMapping::from([
            ("api".to_string(), entry("API", &a.id, Some("met-x"))),
            ("web".to_string(), entry("Website", &w.id, None)),
        ]);
        page.fail(PageOp::SubmitMetricData);

        let out = sync_components(
            &page,
            &mapping,
            &report(&[
                ("API", ComponentStatus::Operational, Some(10.0)),
                ("Website", ComponentStatus::MajorOutage, None),
            ]),
            now(),
        );
        assert_eq!(out.updated.len(), 2);
        assert!(!out.has_errors());
        assert_eq!(out.errors.len(), 1);

        page.recover(PageOp::SubmitMetricData);
        page.fail(PageOp::UpdateComponent);
        let out = sync_components(
            &page,
            &mapping,
            &report(&[("API", ComponentStatus::Operational, None), ("Website", ComponentStatus::Operational, None)]),
            now(),
        );
        assert!(out.has_errors());
        assert_eq!(out.errors.len(), 2);
    }
}
