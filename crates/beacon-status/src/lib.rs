//! beacon-status: status classification and the monitor pass.
//!
//! # Architecture
//!
//! ```text
//! StatusMonitor::run
//!   ├── for each check in checks.json
//!   │   ├── MetricSource::fetch() → MetricSample
//!   │   └── classify(sample, effective thresholds) → ComponentStatus
//!   ├── build_status_report() → StatusReport (overall = worst component)
//!   ├── has_status_changed(previous, new)   (logging only)
//!   └── ReportStore::save()                 (always overwritten)
//! ```
//!
//! # Conservative failure handling
//!
//! A check with any missing metric is reported as `major_outage`: if we
//! cannot confirm a service is healthy we do not claim it is.

pub mod classifier;
pub mod monitor;
pub mod report;

pub use classifier::{aggregate, classify};
pub use monitor::{MonitorOutcome, StatusMonitor};
pub use report::{build_status_report, has_status_changed};
