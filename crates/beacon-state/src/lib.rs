//! beacon-state: flat document persistence for Beacon.
//!
//! Beacon keeps no database. The state carried between runs is three JSON
//! documents: the status-source input (`checks.json`), the component mapping
//! (`statuspage.json`), and the last status report (`status.json`). Each is
//! read once at the start of a pass and written once at the end.
//!
//! Writes go to a sibling temp file that is renamed over the target, so a
//! crashed run never leaves a truncated document behind.

pub mod error;
pub mod store;

pub use error::{StateError, StateResult};
pub use store::{DocumentStore, MappingStore, ReportStore, SourceStore};
