//! beacon-core: shared types for the Beacon status automation.
//!
//! Beacon keeps a public status page and a synthetic-monitoring provider in
//! step with one declared list of endpoints (`beacon.toml`). This crate holds
//! the vocabulary every other crate speaks:
//!
//! - **`config`**: the declarative `beacon.toml` (endpoints, thresholds,
//!   incident policy) and the documents generated from it
//! - **`types`**: component status, thresholds, status reports, and the
//!   `job_label → component/metric` mapping document
//! - **`failure`**: per-unit failure records shared by every pass

pub mod config;
pub mod failure;
pub mod types;

pub use config::{BeaconConfig, ConfigError, ConfigResult, EndpointConfig};
pub use failure::{Failure, FailureKind};
pub use types::*;
