//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for the reporter, supporting:
//! - Environment variables for all configurable values
//! - Sensible defaults for report output and per-test attachment caps
//! - Builder pattern for programmatic configuration
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RUN_REPORT_OUTPUT_DIR` | Directory the report is written to | `./reports` |
//! | `RUN_REPORT_FILENAME` | Report file name | `test-report.json` |
//! | `RUN_REPORT_TITLE` | Report title | `Test Report` |
//! | `RUN_REPORT_SCREENSHOT_DIR` | Directory for saved screenshots | `<output dir>/screenshots` |
//! | `RUN_REPORT_SAVE_SCREENSHOTS` | Save screenshots to disk (`true`) or embed them (`false`) | `true` |
//! | `RUN_REPORT_SCREENSHOTS_PER_TEST` | Maximum screenshots kept per test | `10` |
//! | `RUN_REPORT_MAX_LOGS` | Maximum log entries kept per test | `50` |
//! | `RUN_REPORT_MAX_LOG_LENGTH` | Maximum characters per log message | `500` |
//!
//! # Example
//!
//! ```bash
//! # Embed screenshots in the report instead of writing PNG files
//! export RUN_REPORT_SAVE_SCREENSHOTS=false
//!
//! # Keep more log lines per test
//! export RUN_REPORT_MAX_LOGS=200
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

// ============================================================================
// Default Values
// ============================================================================

/// Default report output directory
pub const DEFAULT_OUTPUT_DIR: &str = "./reports";

/// Default report file name
pub const DEFAULT_FILENAME: &str = "test-report.json";

/// Default report title
pub const DEFAULT_REPORT_TITLE: &str = "Test Report";

/// Screenshot subdirectory used when no explicit screenshot directory is set
pub const DEFAULT_SCREENSHOT_SUBDIR: &str = "screenshots";

/// Default maximum number of screenshots kept per test
pub const DEFAULT_MAX_SCREENSHOTS_PER_TEST: usize = 10;

/// Default maximum number of log entries kept per test
pub const DEFAULT_MAX_LOGS_PER_TEST: usize = 50;

/// Default maximum length of a log message (characters)
pub const DEFAULT_MAX_LOG_LENGTH: usize = 500;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the output directory
pub const ENV_OUTPUT_DIR: &str = "RUN_REPORT_OUTPUT_DIR";

/// Environment variable for the report file name
pub const ENV_FILENAME: &str = "RUN_REPORT_FILENAME";

/// Environment variable for the report title
pub const ENV_REPORT_TITLE: &str = "RUN_REPORT_TITLE";

/// Environment variable for the screenshot directory
pub const ENV_SCREENSHOT_DIR: &str = "RUN_REPORT_SCREENSHOT_DIR";

/// Environment variable selecting save-to-disk vs embedded screenshots
pub const ENV_SAVE_SCREENSHOTS: &str = "RUN_REPORT_SAVE_SCREENSHOTS";

/// Environment variable for the per-test screenshot cap
pub const ENV_SCREENSHOTS_PER_TEST: &str = "RUN_REPORT_SCREENSHOTS_PER_TEST";

/// Environment variable for the per-test log cap
pub const ENV_MAX_LOGS: &str = "RUN_REPORT_MAX_LOGS";

/// Environment variable for the log message length limit
pub const ENV_MAX_LOG_LENGTH: &str = "RUN_REPORT_MAX_LOG_LENGTH";

/// Environment variable holding the tracing filter (e.g. `debug`, `run_reporter=trace`)
pub const ENV_LOG: &str = "RUN_REPORT_LOG";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<ReporterConfig> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static ReporterConfig {
    CONFIG.get_or_init(ReporterConfig::from_env)
}

/// How screenshot image data is carried into the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenshotMode {
    /// Decode image data and write it as a PNG file next to the report
    SaveToDisk,
    /// Keep the encoded image data inline in the report
    Embed,
}

/// Centralized reporter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterConfig {
    /// Directory the report is written to
    pub output_dir: PathBuf,
    /// Report file name inside `output_dir`
    pub filename: String,
    /// Title carried into the rendered report
    pub report_title: String,
    /// Explicit screenshot directory (None = `output_dir/screenshots`)
    pub screenshot_dir: Option<PathBuf>,
    /// Screenshot persistence mode
    pub screenshot_mode: ScreenshotMode,
    /// Maximum screenshots kept per test
    pub max_screenshots_per_test: usize,
    /// Maximum log entries kept per test
    pub max_logs_per_test: usize,
    /// Maximum characters per log message
    pub max_log_length: usize,
}

impl ReporterConfig {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::defaults();
        Self {
            output_dir: env::var(ENV_OUTPUT_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            filename: env::var(ENV_FILENAME).unwrap_or(defaults.filename),
            report_title: env::var(ENV_REPORT_TITLE).unwrap_or(defaults.report_title),
            screenshot_dir: env::var(ENV_SCREENSHOT_DIR).ok().map(PathBuf::from),
            screenshot_mode: env::var(ENV_SAVE_SCREENSHOTS)
                .ok()
                .and_then(|s| parse_bool(&s))
                .map(|save| if save { ScreenshotMode::SaveToDisk } else { ScreenshotMode::Embed })
                .unwrap_or(defaults.screenshot_mode),
            max_screenshots_per_test: env_usize(ENV_SCREENSHOTS_PER_TEST)
                .unwrap_or(defaults.max_screenshots_per_test),
            max_logs_per_test: env_usize(ENV_MAX_LOGS).unwrap_or(defaults.max_logs_per_test),
            max_log_length: env_usize(ENV_MAX_LOG_LENGTH).unwrap_or(defaults.max_log_length),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            filename: DEFAULT_FILENAME.to_string(),
            report_title: DEFAULT_REPORT_TITLE.to_string(),
            screenshot_dir: None,
            screenshot_mode: ScreenshotMode::SaveToDisk,
            max_screenshots_per_test: DEFAULT_MAX_SCREENSHOTS_PER_TEST,
            max_logs_per_test: DEFAULT_MAX_LOGS_PER_TEST,
            max_log_length: DEFAULT_MAX_LOG_LENGTH,
        }
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn report_title(mut self, title: impl Into<String>) -> Self {
        self.report_title = title.into();
        self
    }

    pub fn screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = Some(dir.into());
        self
    }

    pub fn screenshot_mode(mut self, mode: ScreenshotMode) -> Self {
        self.screenshot_mode = mode;
        self
    }

    pub fn max_screenshots_per_test(mut self, max: usize) -> Self {
        self.max_screenshots_per_test = max;
        self
    }

    pub fn max_logs_per_test(mut self, max: usize) -> Self {
        self.max_logs_per_test = max;
        self
    }

    pub fn max_log_length(mut self, max: usize) -> Self {
        self.max_log_length = max;
        self
    }

    /// Directory screenshots are written to in save-to-disk mode
    pub fn resolved_screenshot_dir(&self) -> PathBuf {
        self.screenshot_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_SCREENSHOT_SUBDIR))
    }

    /// Full path of the report file
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.filename)
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn env_usize(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Parse a boolean flag: "true"/"false", "1"/"0", "yes"/"no", "on"/"off"
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
