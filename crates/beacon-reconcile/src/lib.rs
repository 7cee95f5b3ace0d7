//! beacon-reconcile: converge remote state with `beacon.toml`.
//!
//! # Algorithm
//!
//! Each remote system is reconciled independently:
//!
//! 1. List the full remote inventory. Failure here is fatal for that system
//!    only; nothing is mutated.
//! 2. For every desired endpoint: drop stored ids that are no longer in the
//!    inventory, adopt a same-named remote object if one exists, otherwise
//!    create it. Existing objects are updated only when a tracked field
//!    differs.
//! 3. Anything remote (or mapped) that is not desired is an orphan. Orphans
//!    are deleted only when [`ReconcileOptions::allow_deletions`] is set.
//!
//! The regenerated mapping is returned even when individual operations
//! fail, so the caller can persist partial progress.

pub mod checks;
pub mod components;
pub mod documents;
pub mod manage;

use serde::Serialize;

use beacon_core::Failure;

pub use checks::{desired_checks, provision_checks, reconcile_checks};
pub use components::reconcile_statuspage;
pub use documents::{mapping_document, status_source};
pub use manage::{adopt_components, adopt_metrics, cleanup, delete_component, delete_metric};

/// Settings for a reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Delete orphaned remote objects instead of only logging them.
    pub allow_deletions: bool,
}

/// Outcome of reconciling one remote system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    /// Fatal and isolated failures.
    pub errors: Vec<Failure>,
    /// Best-effort failures.
    pub warnings: Vec<Failure>,
}

impl ReconcileReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether any remote object was created, updated, or deleted.
    pub fn changed(&self) -> bool {
        !(self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty())
    }

    pub fn summary(&self) -> String {
        format!(
            "{} created, {} updated, {} deleted, {} errors, {} warnings",
            self.created.len(),
            self.updated.len(),
            self.deleted.len(),
            self.errors.len(),
            self.warnings.len()
        )
    }

    pub(crate) fn error(&mut self, failure: Failure) {
        self.errors.push(failure);
    }

    pub(crate) fn warn(&mut self, subject: impl Into<String>, message: impl std::fmt::Display) {
        self.warnings.push(Failure::best_effort(subject, message));
    }
}
