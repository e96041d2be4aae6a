//! Run Reporter - test-run result trees built from lifecycle events.
//!
//! This crate provides:
//! - An event-driven [`Aggregator`] reconstructing nested suites and tests
//!   from a flat, loosely identified event stream
//! - Two-tier suite resolution (unique id, then most recent title)
//! - Per-test log and screenshot buffering with configurable caps
//! - A [`Renderer`] seam with a bundled JSON renderer
//! - A report writer for the rendered artifact and saved screenshots
//!
//! # Example
//!
//! ```rust
//! use run_reporter::{Aggregator, Event, JsonRenderer, ReporterConfig, TestState};
//!
//! let config = ReporterConfig::defaults();
//! let mut aggregator = Aggregator::new(config, JsonRenderer::new("Smoke"));
//!
//! aggregator.handle(Event::run_start(["login.spec"])).unwrap();
//! aggregator.handle(Event::suite_start("s1", "Login", None)).unwrap();
//! aggregator.handle(Event::test_start("t1", "accepts valid users", Some("s1"))).unwrap();
//! aggregator.handle(Event::test_pass("t1", 42)).unwrap();
//! aggregator.handle(Event::suite_end("s1")).unwrap();
//!
//! let key = aggregator.tree().find_test("t1").unwrap();
//! assert_eq!(aggregator.tree().test(key).state, TestState::Passed);
//!
//! aggregator.handle(Event::run_end()).unwrap();
//! let json = aggregator.into_artifact().unwrap();
//! assert!(json.contains("login.spec"));
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod logging;
pub mod render;
pub mod report;
pub mod screenshot;
pub mod tree;

// Re-export aggregator types
pub use aggregator::{Aggregator, AttachmentLimits, Event, TestAttachments};

// Re-export configuration
pub use config::{ReporterConfig, ScreenshotMode};

// Re-export error types
pub use error::{Anomaly, ReferenceKind, ReportError, ReportResult};

// Re-export rendering and output
pub use render::{JsonRenderer, RenderedRun, Renderer, SnapshotRenderer};
pub use report::ReportWriter;
pub use screenshot::PendingScreenshot;

// Re-export tree types
pub use tree::{
    ErrorInfo, IdentityResolver, LogEntry, LogLevel, ResultTree, RunCounts, RunMetadata,
    RunSummary, ScreenshotRef, ScreenshotSource, SuiteKey, SuiteNode, SuiteStats, TestKey,
    TestNode, TestState,
};
