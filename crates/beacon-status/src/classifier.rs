//! Threshold classification.
//!
//! Reachability and latency are judged independently against two-tier
//! cutoffs and the worse verdict wins.

use tracing::warn;

use beacon_core::{ComponentStatus, Thresholds};

/// Classify one metric sample.
///
/// Returns `MajorOutage` when either metric is absent.
pub fn classify(
    reachability: Option<f64>,
    latency_ms: Option<f64>,
    thresholds: &Thresholds,
) -> ComponentStatus {
    let (Some(reachability), Some(latency_ms)) = (reachability, latency_ms) else {
        warn!("missing metrics, reporting major_outage");
        return ComponentStatus::MajorOutage;
    };

    reachability_status(reachability, thresholds).worst(latency_status(latency_ms, thresholds))
}

/// Worst status in `statuses`; `Operational` when empty.
pub fn aggregate<I>(statuses: I) -> ComponentStatus
where
    I: IntoIterator<Item = ComponentStatus>,
{
    statuses
        .into_iter()
        .fold(ComponentStatus::Operational, ComponentStatus::worst)
}

fn reachability_status(reachability: f64, t: &Thresholds) -> ComponentStatus {
    if reachability >= t.reachability_operational {
        ComponentStatus::Operational
    } else if reachability >= t.reachability_degraded {
        ComponentStatus::DegradedPerformance
    } else {
        ComponentStatus::MajorOutage
    }
}

fn latency_status(latency_ms: f64, t: &Thresholds) -> ComponentStatus {
    if latency_ms <= t.latency_operational_ms {
        ComponentStatus::Operational
    } else if latency_ms <= t.latency_degraded_ms {
        ComponentStatus::DegradedPerformance
    } else {
        ComponentStatus::MajorOutage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ComponentStatus::*;

    fn t() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn healthy_sample_is_operational() {
        assert_eq!(classify(Some(100.0), Some(50.0), &t()), Operational);
    }

    #[test]
    fn any_missing_metric_is_major_outage() {
        for x in [0.0, 50.0, 99.9, 100.0, 10_000.0] {
            assert_eq!(classify(None, Some(x), &t()), MajorOutage);
            assert_eq!(classify(Some(x), None, &t()), MajorOutage);
        }
        assert_eq!(classify(None, None, &t()), MajorOutage);
    }

    #[test]
    fn reachability_boundaries_inclusive_on_good_side() {
        assert_eq!(classify(Some(95.0), Some(10.0), &t()), Operational);
        assert_eq!(classify(Some(94.0), Some(10.0), &t()), DegradedPerformance);
        assert_eq!(classify(Some(75.0), Some(10.0), &t()), DegradedPerformance);
        assert_eq!(classify(Some(74.0), Some(10.0), &t()), MajorOutage);
    }

    #[test]
    fn latency_boundaries_inclusive_on_good_side() {
        assert_eq!(classify(Some(100.0), Some(200.0), &t()), Operational);
        assert_eq!(classify(Some(100.0), Some(201.0), &t()), DegradedPerformance);
        assert_eq!(classify(Some(100.0), Some(1000.0), &t()), DegradedPerformance);
        assert_eq!(classify(Some(100.0), Some(1001.0), &t()), MajorOutage);
    }

    #[test]
    fn worse_of_the_two_wins() {
        assert_eq!(classify(Some(80.0), Some(50.0), &t()), DegradedPerformance);
        assert_eq!(classify(Some(100.0), Some(5000.0), &t()), MajorOutage);
        assert_eq!(classify(Some(10.0), Some(500.0), &t()), MajorOutage);
    }

    #[test]
    fn improving_a_metric_never_worsens_status() {
        let reach = [0.0, 50.0, 74.9, 75.0, 80.0, 94.9, 95.0, 99.0, 100.0];
        let lat = [0.0, 100.0, 200.0, 200.1, 600.0, 1000.0, 1000.1, 5000.0];

        for &l in &lat {
            for pair in reach.windows(2) {
                let worse = classify(Some(pair[0]), Some(l), &t());
                let better = classify(Some(pair[1]), Some(l), &t());
                assert!(better <= worse, "reachability {pair:?} at latency {l}");
            }
        }
        for &r in &reach {
            for pair in lat.windows(2) {
                // pair[0] is the lower (better) latency.
                let better = classify(Some(r), Some(pair[0]), &t());
                let worse = classify(Some(r), Some(pair[1]), &t());
                assert!(better <= worse, "latency {pair:?} at reachability {r}");
            }
        }
    }

    #[test]
    fn custom_thresholds_are_respected() {
        let relaxed = Thresholds {
            latency_operational_ms: 2000.0,
            latency_degraded_ms: 5000.0,
            ..Thresholds::default()
        };
        assert_eq!(classify(Some(99.0), Some(1500.0), &relaxed), Operational);
        assert_eq!(classify(Some(99.0), Some(1500.0), &t()), MajorOutage);
    }

    #[test]
    fn aggregate_empty_is_operational() {
        assert_eq!(aggregate([]), Operational);
    }

    #[test]
    fn aggregate_returns_worst() {
        assert_eq!(aggregate([Operational, DegradedPerformance]), DegradedPerformance);
        assert_eq!(aggregate([Operational, Operational]), Operational);
    }

    #[test]
    fn aggregate_with_major_outage_is_major_outage() {
        assert_eq!(aggregate([MajorOutage, Operational]), MajorOutage);
        assert_eq!(aggregate([Operational, DegradedPerformance, MajorOutage]), MajorOutage);
        assert_eq!(aggregate([DegradedPerformance, MajorOutage, DegradedPerformance]), MajorOutage);
    }
}
