//! Node and metadata types of the result tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Handle to a suite stored in a [`ResultTree`](super::ResultTree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiteKey(pub(crate) usize);

/// Handle to a test stored in a [`ResultTree`](super::ResultTree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestKey(pub(crate) usize);

/// Outcome of a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestState {
    Pending,
    Passed,
    Failed,
    Skipped,
}

impl TestState {
    /// Whether the test has finished
    pub fn is_terminal(self) -> bool {
        !matches!(self, TestState::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TestState::Pending => "pending",
            TestState::Passed => "passed",
            TestState::Failed => "failed",
            TestState::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for TestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a captured log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

/// A log line attached to a test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    /// Create an entry, truncating the message to `max_len` characters
    pub fn truncated(level: LogLevel, message: &str, max_len: usize) -> Self {
        let message = match message.char_indices().nth(max_len) {
            Some((cut, _)) => message[..cut].to_string(),
            None => message.to_string(),
        };
        Self { level, message }
    }
}

/// Where a screenshot's image lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreenshotSource {
    /// Stored file, relative to the report output directory when the reporter wrote it
    File { path: PathBuf },
    /// Base64 image data embedded in the report
    Inline { data: String },
}

/// A screenshot attached to a test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotRef {
    /// "Screenshot N", numbered per test
    pub title: String,

    #[serde(flatten)]
    pub source: ScreenshotSource,

    pub timestamp: DateTime<Utc>,
}

impl ScreenshotRef {
    pub fn path(&self) -> Option<&PathBuf> {
        match &self.source {
            ScreenshotSource::File { path } => Some(path),
            ScreenshotSource::Inline { .. } => None,
        }
    }
}

/// Failure detail carried by a failed test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// A single test and everything attached to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestNode {
    pub id: String,
    pub title: String,
    pub state: TestState,
    /// Milliseconds, as reported by the terminal event
    pub duration: u64,
    pub logs: Vec<LogEntry>,
    pub screenshots: Vec<ScreenshotRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(skip)]
    pub(crate) suite: SuiteKey,
}

impl TestNode {
    pub(crate) fn pending(id: String, title: String, suite: SuiteKey) -> Self {
        Self {
            id,
            title,
            state: TestState::Pending,
            duration: 0,
            logs: Vec::new(),
            screenshots: Vec::new(),
            error: None,
            suite,
        }
    }

    /// The suite owning this test
    pub fn suite(&self) -> SuiteKey {
        self.suite
    }
}

/// Start/end stamps of a suite
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuiteTiming {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Milliseconds; unset unless both start and end were recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

/// A suite of tests, possibly nested in another suite
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteNode {
    pub id: String,
    pub title: String,
    /// Spec file this root suite was discovered from
    pub provenance: Option<String>,
    pub timing: SuiteTiming,
    pub(crate) parent: Option<SuiteKey>,
    pub(crate) children: Vec<SuiteKey>,
    pub(crate) tests: Vec<TestKey>,
}

impl SuiteNode {
    pub(crate) fn new(id: String, title: String, parent: Option<SuiteKey>) -> Self {
        Self {
            id,
            title,
            provenance: None,
            timing: SuiteTiming::default(),
            parent,
            children: Vec::new(),
            tests: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<SuiteKey> {
        self.parent
    }

    /// Child suites in discovery order
    pub fn child_keys(&self) -> &[SuiteKey] {
        &self.children
    }

    /// Tests in discovery order
    pub fn test_keys(&self) -> &[TestKey] {
        &self.tests
    }

    /// A suite is closed once suite-end stamped it
    pub fn is_closed(&self) -> bool {
        self.timing.end.is_some()
    }
}

/// Per-suite outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SuiteStats {
    pub tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
}

impl SuiteStats {
    pub(crate) fn record(&mut self, state: TestState) {
        self.tests += 1;
        match state {
            TestState::Pending => self.pending += 1,
            TestState::Passed => self.passed += 1,
            TestState::Failed => self.failed += 1,
            TestState::Skipped => self.skipped += 1,
        }
    }

    pub(crate) fn merge(&mut self, other: SuiteStats) {
        self.tests += other.tests;
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.pending += other.pending;
    }
}

/// Aggregate outcome counters of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunCounts {
    pub(crate) fn record(&mut self, state: TestState) {
        match state {
            TestState::Passed => self.passed += 1,
            TestState::Failed => self.failed += 1,
            TestState::Skipped => self.skipped += 1,
            TestState::Pending => {}
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

/// Run-level metadata handed to the renderer alongside the tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunMetadata {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Spec files in discovery order
    pub specs: Vec<String>,
    pub counts: RunCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// Figures derived from [`RunMetadata`] for report headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    /// Rounded percentage of passed tests, 0 for an empty run
    pub pass_rate: u32,
    /// Whole seconds between run start and end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<i64>,
}

impl RunMetadata {
    pub fn summary(&self) -> RunSummary {
        let total = self.counts.total();
        let pass_rate = if total > 0 {
            ((self.counts.passed as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };
        let duration_secs = match (self.start, self.end) {
            (Some(start), Some(end)) => {
                Some(((end - start).num_milliseconds() as f64 / 1000.0).round() as i64)
            }
            _ => None,
        };
        RunSummary {
            total,
            pass_rate,
            duration_secs,
        }
    }
}
