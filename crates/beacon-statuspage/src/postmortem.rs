//! Postmortem rendering for resolved incidents.

use chrono::{DateTime, Utc};

use crate::types::{Incident, IncidentUpdate, parse_timestamp};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Render the markdown postmortem for `incident`.
///
/// The timeline lists updates newest first. Timestamps that do not parse
/// are shown verbatim and sorted after the dated entries; missing ones
/// read `unknown`.
pub fn render_postmortem(incident: &Incident, component: &str, resolved_at: DateTime<Utc>) -> String {
    let name = if incident.name.is_empty() {
        "Incident"
    } else {
        incident.name.as_str()
    };
    let started = display_time(incident.created_at.as_deref());
    let resolved = resolved_at.format(TIME_FORMAT);

    let mut out = format!(
        "## Postmortem: {name}\n\
         \n\
         ### Summary\n\
         \n\
         **Component:** {component}\n\
         **Impact:** {impact}\n\
         **Started:** {started}\n\
         **Resolved:** {resolved}\n\
         \n\
         This incident was automatically detected by our monitoring system and resolved \
         when services returned to normal operation.\n\
         \n\
         ### Timeline\n\
         \n\
         {timeline}\n\
         \n",
        impact = incident.impact,
        timeline = timeline(&incident.incident_updates),
    );
    out.push_str(BOILERPLATE);
    out
}

fn timeline(updates: &[IncidentUpdate]) -> String {
    if updates.is_empty() {
        return "- No detailed updates recorded.".to_string();
    }

    let mut ordered: Vec<(Option<DateTime<Utc>>, &IncidentUpdate)> = updates
        .iter()
        .map(|u| (u.created_at.as_deref().and_then(parse_timestamp), u))
        .collect();
    // Stable: undated entries keep their input order after the dated ones.
    ordered.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    ordered
        .into_iter()
        .map(|(parsed, u)| {
            let when = match parsed {
                Some(t) => t.format(TIME_FORMAT).to_string(),
                None => display_time(u.created_at.as_deref()),
            };
            let status = if u.status.is_empty() { "update" } else { u.status.as_str() };
            format!("- **{when}** [{status}]: {}", u.body)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn display_time(raw: Option<&str>) -> String {
    match raw {
        None => "unknown".to_string(),
        Some(s) if s.trim().is_empty() => "unknown".to_string(),
        Some(s) => match parse_timestamp(s) {
            Some(t) => t.format(TIME_FORMAT).to_string(),
            None => s.to_string(),
        },
    }
}

const BOILERPLATE: &str = "### Root Cause

This incident was detected via automated monitoring. The root cause was identified as a \
service degradation that was automatically resolved. If further investigation is needed, \
a manual follow-up will be added.

### Resolution

The service returned to normal operation and was automatically marked as resolved by our \
monitoring system.

### Preventive Measures

- Continuous automated monitoring remains active
- Alerting thresholds are reviewed periodically
- This postmortem was auto-generated and may be updated with additional details

---
*This postmortem was automatically generated by the status page monitoring system.*
";
