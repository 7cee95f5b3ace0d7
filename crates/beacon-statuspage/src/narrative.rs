//! Public-facing incident text.

use beacon_core::ComponentStatus;

pub fn incident_name(component: &str, status: ComponentStatus) -> String {
    let what = match status {
        ComponentStatus::DegradedPerformance => "degraded performance",
        ComponentStatus::MajorOutage => "a major outage",
        ComponentStatus::Operational => "issues",
    };
    format!("{component} experiencing {what}")
}

/// Body of the first update of a new incident.
pub fn creation_body(component: &str, status: ComponentStatus) -> String {
    match status {
        ComponentStatus::MajorOutage => format!(
            "We're aware of a major outage affecting **{component}**. Our team is actively \
             investigating and working to restore service as quickly as possible."
        ),
        ComponentStatus::DegradedPerformance => format!(
            "We're investigating reports of degraded performance affecting **{component}**. \
             Some users may experience slower response times or intermittent errors. \
             We'll provide updates as we learn more."
        ),
        ComponentStatus::Operational => format!(
            "We're investigating an issue affecting **{component}**. \
             We'll provide updates as we learn more."
        ),
    }
}

/// Body of a periodic update when nothing has changed.
pub fn heartbeat_body(component: &str, status: ComponentStatus) -> String {
    let detail = match status {
        ComponentStatus::MajorOutage => "The service remains unavailable. ",
        ComponentStatus::DegradedPerformance => {
            "The service remains operating with reduced performance. "
        }
        ComponentStatus::Operational => "",
    };
    format!(
        "We continue to monitor the situation affecting **{component}**. {detail}\
         Our team is actively working on a resolution."
    )
}

/// Body of an update that changes the incident's impact. `worsened`
/// tells an escalation from a partial recovery.
pub fn escalation_body(component: &str, status: ComponentStatus, worsened: bool) -> String {
    if !worsened {
        let detail = match status {
            ComponentStatus::DegradedPerformance => {
                "The service is available again but still operating with reduced performance. "
            }
            _ => "",
        };
        return format!(
            "The situation affecting **{component}** has improved. {detail}\
             We continue to work toward a full recovery."
        );
    }
    let what = match status {
        ComponentStatus::MajorOutage => "a major outage",
        ComponentStatus::DegradedPerformance => "degraded performance",
        ComponentStatus::Operational => "a wider issue",
    };
    format!(
        "The situation affecting **{component}** has escalated to {what}. \
         Our team is working urgently to restore normal operation."
    )
}

pub fn resolution_body(component: &str) -> String {
    format!(
        "This incident has been resolved. **{component}** is back to normal operation. \
         Thank you for your patience."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ComponentStatus::*;

    #[test]
    fn names_describe_severity() {
        assert_eq!(incident_name("API", DegradedPerformance), "API experiencing degraded performance");
        assert_eq!(incident_name("API", MajorOutage), "API experiencing a major outage");
    }

    #[test]
    fn four_bodies_are_distinct() {
        for status in [DegradedPerformance, MajorOutage] {
            let bodies = [
                creation_body("API", status),
                heartbeat_body("API", status),
                escalation_body("API", MajorOutage, true),
                escalation_body("API", DegradedPerformance, false),
                resolution_body("API"),
            ];
            for (i, a) in bodies.iter().enumerate() {
                assert!(a.contains("**API**"));
                for b in &bodies[i + 1..] {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn impact_change_reads_in_its_direction() {
        let worse = escalation_body("Web", MajorOutage, true);
        assert!(worse.contains("escalated to a major outage"));
        assert!(!worse.contains("improved"));

        let better = escalation_body("Web", DegradedPerformance, false);
        assert!(better.contains("has improved"));
        assert!(better.contains("reduced performance"));
        assert!(!better.contains("escalated"));
    }

    #[test]
    fn heartbeat_mentions_current_state() {
        assert!(heartbeat_body("Web", MajorOutage).contains("remains unavailable"));
        assert!(heartbeat_body("Web", DegradedPerformance).contains("reduced performance"));
    }
}
