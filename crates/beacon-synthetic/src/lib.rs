//! beacon-synthetic: the synthetic-monitoring provider.
//!
//! Checks are keyed by their job name, which is also the `job` label the
//! metric source queries. [`SyntheticApi`] is what reconciliation talks to;
//! [`SyntheticMonitoringClient`] implements it over HTTP after a one-time
//! [`register`](SyntheticMonitoringClient::register).

pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use client::{DEFAULT_API_URL, SyntheticApi, SyntheticConfig, SyntheticMonitoringClient};
pub use error::{SyntheticError, SyntheticResult};
pub use memory::{InMemorySynthetic, SyntheticCall, SyntheticOp};
pub use types::{CheckSpec, Probe, Registration, SyntheticCheck};
