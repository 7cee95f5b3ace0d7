//! Documents regenerated from `beacon.toml` on every reconcile.

use beacon_core::{BeaconConfig, Check, ComponentMapping, MappingDocument, StatusSource};

/// The status-source input (`checks.json`): every endpoint, with or without
/// a component, in job-label order.
pub fn status_source(config: &BeaconConfig) -> StatusSource {
    let checks = config
        .endpoints
        .iter()
        .map(|(job, e)| Check {
            name: e.name.clone(),
            job_label: job.clone(),
            url: e.url.clone(),
            description: e.description.clone(),
            thresholds: e.thresholds.clone(),
            headers: e.headers.clone(),
        })
        .collect();

    StatusSource {
        settings: config.settings.clone(),
        checks,
    }
}

/// The mapping document (`statuspage.json`) for a reconciled mapping.
pub fn mapping_document(config: &BeaconConfig, mapping: ComponentMapping) -> MappingDocument {
    MappingDocument {
        page_id: config.statuspage.page_id.clone(),
        component_mapping: mapping,
        incidents: config.incidents.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::MappingEntry;

    const CONFIG: &str = r#"
[statuspage]
page_id = "page-1"

[incidents]
notify_subscribers = false

[endpoints.web]
name = "Website"
url = "https://example.com"
component = false

[endpoints.api]
name = "API"
url = "https://api.example.com"
description = "Public API"

[endpoints.api.thresholds.latency_ms]
degraded = 3000
"#;

    #[test]
    fn status_source_lists_every_endpoint() {
        let config = BeaconConfig::parse(CONFIG).unwrap();
        let source = status_source(&config);

        let jobs: Vec<_> = source.checks.iter().map(|c| c.job_label.as_str()).collect();
        assert_eq!(jobs, vec!["api", "web"]);
        assert_eq!(source.checks[0].description, "Public API");
        assert!(source.checks[0].thresholds.is_some());
        assert!(source.checks[1].thresholds.is_none());
        assert_eq!(source.settings.reachability_query_window, "15m");
    }

    #[test]
    fn mapping_document_carries_page_and_policy() {
        let config = BeaconConfig::parse(CONFIG).unwrap();
        let mut mapping = ComponentMapping::new();
        mapping.insert(
            "api".into(),
            MappingEntry {
                name: "API".into(),
                component_id: Some("cmp-1".into()),
                metric_id: None,
            },
        );

        let doc = mapping_document(&config, mapping);
        assert_eq!(doc.page_id, "page-1");
        assert!(!doc.incidents.notify_subscribers);
        assert!(doc.incidents.auto_create);
        assert_eq!(doc.component_mapping["api"].component_id.as_deref(), Some("cmp-1"));
    }
}
