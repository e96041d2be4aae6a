//! Error and anomaly types.
//!
//! [`ReportError`] covers the fallible I/O around the core (writing the
//! report, reading event streams, rendering). [`Anomaly`] covers everything
//! the aggregator tolerates: it is recorded and logged, never propagated.

use serde::Serialize;
use thiserror::Error;

use crate::tree::TestState;

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors that can occur while rendering or writing a report
#[derive(Debug, Error)]
pub enum ReportError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The renderer failed to produce an artifact
    #[error("render error: {0}")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The artifact was requested before run-end was processed
    #[error("run has not finished; no report was rendered")]
    NotFinished,
}

/// What kind of reference could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    /// Parent reference of a starting suite
    SuiteParent,
    /// Parent reference of a starting test
    TestParent,
    /// Suite named by suite-end
    Suite,
    /// Test named by a status event or screenshot command
    Test,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReferenceKind::SuiteParent => "suite parent",
            ReferenceKind::TestParent => "test parent",
            ReferenceKind::Suite => "suite",
            ReferenceKind::Test => "test",
        };
        f.write_str(name)
    }
}

/// A non-fatal irregularity in the event stream
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "anomaly", rename_all = "kebab-case")]
pub enum Anomaly {
    /// An event named a suite or test that is not in the tree
    #[error("{event}: unresolved {kind} reference '{reference}'")]
    UnresolvedReference {
        event: &'static str,
        kind: ReferenceKind,
        reference: String,
    },

    /// A test reported a terminal state more than once
    #[error("test '{id}' reported {next} after already being {previous}")]
    DuplicateTerminalState {
        id: String,
        previous: TestState,
        next: TestState,
    },

    /// The event could not be parsed or lacks a required field
    #[error("{event}: malformed payload: {reason}")]
    MalformedPayload { event: String, reason: String },

    /// An event arrived after run-end
    #[error("{event}: ignored, run already finished")]
    LateEvent { event: &'static str },
}

impl Anomaly {
    pub(crate) fn unresolved(
        event: &'static str,
        kind: ReferenceKind,
        reference: impl Into<String>,
    ) -> Self {
        Anomaly::UnresolvedReference {
            event,
            kind,
            reference: reference.into(),
        }
    }

    pub(crate) fn malformed(event: impl Into<String>, reason: impl Into<String>) -> Self {
        Anomaly::MalformedPayload {
            event: event.into(),
            reason: reason.into(),
        }
    }

    /// True for [`Anomaly::UnresolvedReference`]
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Anomaly::UnresolvedReference { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_display() {
        let anomaly = Anomaly::unresolved("test-fail", ReferenceKind::Test, "t7");
        assert_eq!(anomaly.to_string(), "test-fail: unresolved test reference 't7'");

        let anomaly = Anomaly::DuplicateTerminalState {
            id: "t1".to_string(),
            previous: TestState::Passed,
            next: TestState::Failed,
        };
        assert_eq!(
            anomaly.to_string(),
            "test 't1' reported failed after already being passed"
        );
    }

    #[test]
    fn test_anomaly_serializes_with_anomaly_tag() {
        let anomaly = Anomaly::malformed("suite-start", "missing field `id`");
        let json = serde_json::to_value(&anomaly).unwrap();
        assert_eq!(json["anomaly"], "malformed-payload");
        assert_eq!(json["event"], "suite-start");

        let anomaly = Anomaly::unresolved("test-fail", ReferenceKind::Test, "t7");
        let json = serde_json::to_value(&anomaly).unwrap();
        assert_eq!(json["anomaly"], "unresolved-reference");
        assert_eq!(json["kind"], "test");
        assert_eq!(json["reference"], "t7");
    }
}
