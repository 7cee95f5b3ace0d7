//! beacon-statuspage: everything Beacon does on the public status page.
//!
//! - **`client`**: the [`StatusPageApi`] seam and the blocking HTTP client
//! - **`memory`**: an in-memory page that records calls, for tests
//! - **`incident`**: the incident lifecycle engine
//! - **`narrative`** / **`postmortem`**: the text Beacon publishes
//! - **`sync`**: pushing component status and latency

pub mod client;
pub mod error;
pub mod incident;
pub mod memory;
pub mod narrative;
pub mod postmortem;
pub mod sync;
pub mod types;

pub use client::{StatusPageApi, StatuspageClient};
pub use error::{StatusPageError, StatusPageResult};
pub use incident::{Decision, IncidentEngine, IncidentPolicy, IncidentRunReport, decide};
pub use memory::{InMemoryStatusPage, PageCall, PageOp};
pub use postmortem::render_postmortem;
pub use sync::{SyncReport, sync_components};
pub use types::*;
