//! Per-unit failure records.
//!
//! Passes never propagate errors past the unit they occurred in. Each
//! failure is captured here with its severity class and collected into the
//! pass report; only `Fatal` and `Isolated` failures make a run unsuccessful.

use std::fmt;

use serde::Serialize;

/// Severity class of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The baseline needed for the pass could not be obtained; the pass stopped.
    Fatal,
    /// One unit (check, component, incident) failed; siblings were unaffected.
    Isolated,
    /// A secondary side effect failed after its primary action succeeded.
    BestEffort,
}

/// A failure attributed to one subject (job label, component, incident id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub subject: String,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, subject: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.to_string(),
        }
    }

    pub fn fatal(subject: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::new(FailureKind::Fatal, subject, message)
    }

    pub fn isolated(subject: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::new(FailureKind::Isolated, subject, message)
    }

    pub fn best_effort(subject: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::new(FailureKind::BestEffort, subject, message)
    }

    /// Whether this failure should make the run exit unsuccessfully.
    pub fn is_error(&self) -> bool {
        !matches!(self.kind, FailureKind::BestEffort)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_effort_is_not_an_error() {
        assert!(Failure::fatal("incidents", "boom").is_error());
        assert!(Failure::isolated("api", "boom").is_error());
        assert!(!Failure::best_effort("postmortem inc-1", "boom").is_error());
    }

    #[test]
    fn display_names_subject() {
        let f = Failure::isolated("Create component API", "HTTP 500");
        assert_eq!(f.to_string(), "Create component API: HTTP 500");
    }
}
