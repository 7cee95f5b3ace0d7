//! Status report construction and change detection.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use beacon_core::{Check, ComponentReport, ComponentStatus, StatusReport, Thresholds};
use beacon_metrics::MetricSample;

use crate::classifier::{aggregate, classify};

/// Build a report for `checks` from the fetched `samples`.
///
/// Checks without a sample are treated as having no data. Each check is
/// judged against `global` with its own overrides applied.
pub fn build_status_report(
    checks: &[Check],
    samples: &HashMap<String, MetricSample>,
    global: Thresholds,
    now: DateTime<Utc>,
) -> StatusReport {
    let components: Vec<ComponentReport> = checks
        .iter()
        .map(|check| {
            let sample = samples.get(&check.job_label).copied().unwrap_or_default();
            let thresholds = check.effective_thresholds(global);
            ComponentReport {
                name: check.name.clone(),
                description: check.description.clone(),
                status: classify(sample.reachability, sample.latency_ms, &thresholds),
                reachability: sample.reachability.map(round2),
                latency_ms: sample.latency_ms.map(round2),
                last_checked: now,
            }
        })
        .collect();

    StatusReport {
        last_updated: now,
        overall_status: aggregate(components.iter().map(|c| c.status)),
        components,
    }
}

/// Whether any status (not metric value) differs between two reports.
///
/// A missing previous report always counts as a change.
pub fn has_status_changed(previous: Option<&StatusReport>, current: &StatusReport) -> bool {
    let Some(previous) = previous else {
        return true;
    };

    if previous.overall_status != current.overall_status {
        return true;
    }

    statuses_by_name(previous) != statuses_by_name(current)
}

fn statuses_by_name(report: &StatusReport) -> HashMap<&str, ComponentStatus> {
    report
        .components
        .iter()
        .map(|c| (c.name.as_str(), c.status))
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::{ThresholdOverrides, TierCutoffs};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap()
    }

    fn check(job: &str, name: &str) -> Check {
        Check {
            name: name.to_string(),
            job_label: job.to_string(),
            url: format!("https://{job}.example.com"),
            description: format!("{name} service"),
            thresholds: None,
            headers: Vec::new(),
        }
    }

    fn samples(entries: &[(&str, Option<f64>, Option<f64>)]) -> HashMap<String, MetricSample> {
        entries
            .iter()
            .map(|(job, r, l)| (job.to_string(), MetricSample::new(*r, *l)))
            .collect()
    }

    #[test]
    fn report_lists_every_check_in_order() {
        let checks = vec![check("api", "API"), check("web", "Website")];
        let s = samples(&[("api", Some(99.123), Some(120.456)), ("web", Some(80.0), Some(50.0))]);

        let report = build_status_report(&checks, &s, Thresholds::default(), now());

        assert_eq!(report.components.len(), 2);
        assert_eq!(report.components[0].name, "API");
        assert_eq!(report.components[0].status, ComponentStatus::Operational);
        assert_eq!(report.components[0].reachability, Some(99.12));
        assert_eq!(report.components[0].latency_ms, Some(120.46));
        assert_eq!(report.components[0].description, "API service");
        assert_eq!(report.components[1].status, ComponentStatus::DegradedPerformance);
        assert_eq!(report.overall_status, ComponentStatus::DegradedPerformance);
        assert_eq!(report.last_updated, now());
        assert!(report.components.iter().all(|c| c.last_checked == now()));
    }

    #[test]
    fn missing_sample_is_major_outage() {
        let checks = vec![check("api", "API")];
        let report = build_status_report(&checks, &HashMap::new(), Thresholds::default(), now());

        assert_eq!(report.components[0].status, ComponentStatus::MajorOutage);
        assert_eq!(report.components[0].reachability, None);
        assert_eq!(report.overall_status, ComponentStatus::MajorOutage);
    }

    #[test]
    fn per_check_override_applies_only_to_that_check() {
        let mut slow = check("web", "Website");
        slow.thresholds = Some(ThresholdOverrides {
            reachability: TierCutoffs::default(),
            latency_ms: TierCutoffs {
                operational: Some(2000.0),
                degraded: Some(5000.0),
            },
        });
        let checks = vec![check("api", "API"), slow];
        let s = samples(&[("api", Some(100.0), Some(1500.0)), ("web", Some(100.0), Some(1500.0))]);

        let report = build_status_report(&checks, &s, Thresholds::default(), now());

        assert_eq!(report.components[0].status, ComponentStatus::DegradedPerformance);
        assert_eq!(report.components[1].status, ComponentStatus::Operational);
    }

    #[test]
    fn empty_checks_yield_operational() {
        let report = build_status_report(&[], &HashMap::new(), Thresholds::default(), now());
        assert!(report.components.is_empty());
        assert_eq!(report.overall_status, ComponentStatus::Operational);
    }

    #[test]
    fn no_previous_report_is_a_change() {
        let report = build_status_report(&[], &HashMap::new(), Thresholds::default(), now());
        assert!(has_status_changed(None, &report));
    }

    #[test]
    fn metric_drift_alone_is_not_a_change() {
        let checks = vec![check("api", "API")];
        let before = build_status_report(
            &checks,
            &samples(&[("api", Some(99.0), Some(100.0))]),
            Thresholds::default(),
            now(),
        );
        let after = build_status_report(
            &checks,
            &samples(&[("api", Some(97.5), Some(150.0))]),
            Thresholds::default(),
            now() + chrono::Duration::minutes(5),
        );
        assert!(!has_status_changed(Some(&before), &after));
    }

    #[test]
    fn component_status_change_is_detected() {
        let checks = vec![check("api", "API"), check("web", "Website")];
        let before = build_status_report(
            &checks,
            &samples(&[("api", None, None), ("web", Some(99.0), Some(100.0))]),
            Thresholds::default(),
            now(),
        );
        // Overall stays major_outage, but the two components swap.
        let after = build_status_report(
            &checks,
            &samples(&[("api", Some(99.0), Some(100.0)), ("web", None, None)]),
            Thresholds::default(),
            now(),
        );
        assert_eq!(before.overall_status, after.overall_status);
        assert!(has_status_changed(Some(&before), &after));
    }

    #[test]
    fn overall_change_is_detected() {
        let checks = vec![check("api", "API")];
        let before = build_status_report(
            &checks,
            &samples(&[("api", Some(99.0), Some(100.0))]),
            Thresholds::default(),
            now(),
        );
        let after = build_status_report(
            &checks,
            &samples(&[("api", Some(80.0), Some(100.0))]),
            Thresholds::default(),
            now(),
        );
        assert!(has_status_changed(Some(&before), &after));
    }
}
