//! Event-driven construction of the result tree.
//!
//! The [`Aggregator`] consumes lifecycle events one at a time, in arrival
//! order. Structural events (suite-start, test-start) shape the tree;
//! status events settle tests; side-channel events (logs, screenshots) are
//! buffered per test id. Irregular input never aborts the run: it is
//! recorded as an [`Anomaly`], logged, and handled by a fixed policy.
//!
//! Logs and emitted screenshots carry no test id. They go to the test most
//! recently started, which assumes tests of one aggregator run sequentially.

pub mod events;
pub mod side_channel;

pub use events::Event;
pub use side_channel::{AttachmentLimits, SideChannels, TestAttachments};

use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::{ReporterConfig, ScreenshotMode};
use crate::error::{Anomaly, ReferenceKind, ReportError, ReportResult};
use crate::render::Renderer;
use crate::screenshot::{self, PendingScreenshot};
use crate::tree::{LogLevel, ResultTree, RunMetadata, ScreenshotSource, TestKey, TestState};
use events::{ScreenshotCommand, SuiteEnd, SuiteStart, TestOutcome, TestStart};

/// Builds a [`ResultTree`] from lifecycle events and renders it once at run-end
pub struct Aggregator<R: Renderer> {
    config: ReporterConfig,
    tree: ResultTree,
    metadata: RunMetadata,
    side_channels: SideChannels,
    /// Target of logs and emitted screenshots; only test-start moves it
    current_test: Option<String>,
    /// Index of the next spec file to hand out as root-suite provenance
    next_spec: usize,
    pending_screenshots: Vec<PendingScreenshot>,
    /// Screenshot files queued over the aggregator's lifetime
    saved_screenshots: usize,
    anomalies: Vec<Anomaly>,
    renderer: R,
    artifact: Option<R::Artifact>,
    finished: bool,
}

impl<R: Renderer> Aggregator<R> {
    pub fn new(config: ReporterConfig, renderer: R) -> Self {
        let limits = AttachmentLimits {
            max_logs: config.max_logs_per_test,
            max_log_length: config.max_log_length,
            max_screenshots: config.max_screenshots_per_test,
        };
        Self {
            config,
            tree: ResultTree::new(),
            metadata: RunMetadata::default(),
            side_channels: SideChannels::new(limits),
            current_test: None,
            next_spec: 0,
            pending_screenshots: Vec::new(),
            saved_screenshots: 0,
            anomalies: Vec::new(),
            renderer,
            artifact: None,
            finished: false,
        }
    }

    /// Parse one JSON event and process it. Unparseable input is recorded
    /// as a malformed payload and skipped.
    pub fn ingest_json(&mut self, line: &str) -> ReportResult<()> {
        match Event::from_json(line) {
            Ok(event) => self.handle(event),
            Err(anomaly) => {
                self.flag(anomaly);
                Ok(())
            }
        }
    }

    /// Process one event.
    ///
    /// Only run-end can fail, and only when the renderer does; every other
    /// irregularity is recorded in [`Aggregator::anomalies`].
    pub fn handle(&mut self, event: Event) -> ReportResult<()> {
        if self.finished {
            self.flag(Anomaly::LateEvent { event: event.name() });
            return Ok(());
        }
        if let Err(anomaly) = event.validate() {
            self.flag(anomaly);
            return Ok(());
        }

        let state = event.terminal_state();
        match event {
            Event::RunStart(payload) => self.run_start(payload.specs),
            Event::SuiteStart(payload) => self.suite_start(payload),
            Event::TestStart(payload) => self.test_start(payload),
            Event::TestPass(outcome) | Event::TestFail(outcome) | Event::TestSkip(outcome) => {
                if let Some(state) = state {
                    self.test_finished(state, outcome);
                }
            }
            Event::SuiteEnd(payload) => self.suite_end(payload),
            Event::RunEnd {} => return self.run_end(),
            Event::LogEmitted(log) => self.log_emitted(log.level, &log.message),
            Event::ScreenshotEmitted(shot) => self.screenshot_emitted(shot.path),
            Event::ScreenshotCommand(command) => self.screenshot_command(command),
        }
        Ok(())
    }

    fn run_start(&mut self, specs: Vec<String>) {
        info!(specs = specs.len(), "test run started");
        self.tree.clear();
        self.side_channels.clear();
        self.current_test = None;
        self.next_spec = 0;
        self.pending_screenshots.clear();
        self.anomalies.clear();
        self.metadata = RunMetadata {
            start: Some(Utc::now()),
            specs,
            host: hostname::get().ok().and_then(|h| h.into_string().ok()),
            ..RunMetadata::default()
        };
    }

    fn suite_start(&mut self, payload: SuiteStart) {
        // Root suites take spec files in discovery order; a suite whose
        // parent merely failed to resolve is not a root by intent.
        let provenance = match payload.parent_id {
            None if self.next_spec < self.metadata.specs.len() => {
                self.next_spec += 1;
                Some(self.metadata.specs[self.next_spec - 1].clone())
            }
            _ => None,
        };

        let (key, anomaly) = self.tree.insert_suite(
            &payload.id,
            &payload.title,
            payload.parent_id.as_deref(),
            provenance,
        );
        self.tree
            .open_suite(key, payload.start.unwrap_or_else(Utc::now));
        if let Some(anomaly) = anomaly {
            self.flag(anomaly);
        }
    }

    fn test_start(&mut self, payload: TestStart) {
        if self.tree.find_test(&payload.id).is_some() {
            // A retry: the earlier attempt keeps its own logs and screenshots.
            self.side_channels.remove(&payload.id);
        }
        if let Err(anomaly) =
            self.tree
                .insert_test(&payload.id, &payload.title, payload.parent_id.as_deref())
        {
            self.flag(anomaly);
        }
        // Side-channel data keeps flowing to this id even when the test
        // could not be placed.
        self.current_test = Some(payload.id);
    }

    fn test_finished(&mut self, state: TestState, outcome: TestOutcome) {
        self.metadata.counts.record(state);

        let event = match state {
            TestState::Passed => "test-pass",
            TestState::Failed => "test-fail",
            _ => "test-skip",
        };
        let Some(key) = self.tree.find_test(&outcome.id) else {
            self.flag(Anomaly::unresolved(event, ReferenceKind::Test, outcome.id));
            return;
        };

        if let Some(anomaly) =
            self.tree
                .set_terminal_state(key, state, outcome.duration, outcome.error)
        {
            self.flag(anomaly);
        }
        if let Some(attachments) = self.side_channels.get(&outcome.id) {
            let test = self.tree.test_mut(key);
            test.logs = attachments.logs.clone();
            test.screenshots = attachments.screenshots.clone();
        }
    }

    fn suite_end(&mut self, payload: SuiteEnd) {
        match self.tree.resolve_suite(&payload.id) {
            Some(key) => {
                let end = payload.end.unwrap_or_else(Utc::now);
                self.tree.close_suite(key, end);
            }
            None => self.flag(Anomaly::unresolved("suite-end", ReferenceKind::Suite, payload.id)),
        }
    }

    fn run_end(&mut self) -> ReportResult<()> {
        self.metadata.end = Some(Utc::now());
        self.sync_attachments();
        self.finished = true;

        let counts = self.metadata.counts;
        info!(
            passed = counts.passed,
            failed = counts.failed,
            skipped = counts.skipped,
            anomalies = self.anomalies.len(),
            "test run finished"
        );

        let artifact = self
            .renderer
            .render(&self.tree, &self.metadata)
            .map_err(|e| ReportError::Render(Box::new(e)))?;
        self.artifact = Some(artifact);
        Ok(())
    }

    /// Copy every buffer onto the latest test carrying its id. Earlier
    /// attempts of a retried test keep what they had when they finished.
    fn sync_attachments(&mut self) {
        let mut latest: HashMap<&str, TestKey> = HashMap::new();
        for index in 0..self.tree.test_count() {
            let key = TestKey(index);
            latest.insert(self.tree.test(key).id.as_str(), key);
        }
        let updates: Vec<(TestKey, TestAttachments)> = latest
            .into_iter()
            .filter_map(|(id, key)| self.side_channels.get(id).map(|a| (key, a.clone())))
            .collect();

        for (key, attachments) in updates {
            let test = self.tree.test_mut(key);
            test.logs = attachments.logs;
            test.screenshots = attachments.screenshots;
        }
    }

    fn log_emitted(&mut self, level: LogLevel, message: &str) {
        let Some(test_id) = self.current_test.as_deref() else {
            debug!("log emitted outside of any test, dropped");
            return;
        };
        if !self.side_channels.push_log(test_id, level, message) {
            debug!(test = test_id, "log cap reached, entry dropped");
        }
    }

    fn screenshot_emitted(&mut self, path: String) {
        let Some(test_id) = self.current_test.as_deref() else {
            debug!(path = %path, "screenshot emitted outside of any test, dropped");
            return;
        };
        let source = ScreenshotSource::File {
            path: PathBuf::from(path),
        };
        if self.side_channels.push_screenshot(test_id, source).is_none() {
            debug!(test = test_id, "screenshot cap reached, capture dropped");
        }
    }

    fn screenshot_command(&mut self, command: ScreenshotCommand) {
        let test_id = command.correlation_id;
        let Some(seq) = self.side_channels.next_screenshot_seq(&test_id) else {
            debug!(test = %test_id, "screenshot cap reached, capture dropped");
            return;
        };
        if self.tree.find_test(&test_id).is_none() {
            // Still buffered: a later test-start may place this id.
            warn!(test = %test_id, "screenshot command for a test not in the tree");
        }

        let source = match (command.data, command.path) {
            (_, Some(path)) => ScreenshotSource::File {
                path: PathBuf::from(path),
            },
            (Some(data), None) => match self.config.screenshot_mode {
                ScreenshotMode::Embed => ScreenshotSource::Inline { data },
                ScreenshotMode::SaveToDisk => {
                    let bytes = match screenshot::decode_image_data(&data) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            self.flag(Anomaly::malformed(
                                "screenshot-command",
                                format!("image data is not valid base64: {}", e),
                            ));
                            return;
                        }
                    };
                    self.saved_screenshots += 1;
                    let filename = screenshot::screenshot_filename(
                        &test_id,
                        seq,
                        self.saved_screenshots,
                        Utc::now(),
                    );
                    let path = self.config.resolved_screenshot_dir().join(filename);
                    let relative = screenshot::relative_to(&path, &self.config.output_dir);
                    self.pending_screenshots.push(PendingScreenshot { path, bytes });
                    ScreenshotSource::File { path: relative }
                }
            },
            (None, None) => return,
        };
        self.side_channels.push_screenshot(&test_id, source);
    }

    fn flag(&mut self, anomaly: Anomaly) {
        warn!(%anomaly, "event stream anomaly");
        self.anomalies.push(anomaly);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn tree(&self) -> &ResultTree {
        &self.tree
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    /// Irregularities seen since the last run-start
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// Buffered side-channel data of a test id
    pub fn attachments(&self, test_id: &str) -> Option<&TestAttachments> {
        self.side_channels.get(test_id)
    }

    /// Id that logs and emitted screenshots currently go to
    pub fn current_test(&self) -> Option<&str> {
        self.current_test.as_deref()
    }

    /// Whether run-end has been processed
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Screenshot files queued for writing
    pub fn pending_screenshots(&self) -> &[PendingScreenshot] {
        &self.pending_screenshots
    }

    /// Take the queued screenshot writes, leaving the queue empty
    pub fn take_pending_screenshots(&mut self) -> Vec<PendingScreenshot> {
        std::mem::take(&mut self.pending_screenshots)
    }

    /// The rendered artifact, once run-end has been processed
    pub fn artifact(&self) -> Option<&R::Artifact> {
        self.artifact.as_ref()
    }

    pub fn into_artifact(self) -> ReportResult<R::Artifact> {
        self.artifact.ok_or(ReportError::NotFinished)
    }
}
