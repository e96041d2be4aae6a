//! Inbound lifecycle events.
//!
//! Events travel as JSON objects tagged by an `event` field, e.g.
//!
//! ```json
//! {"event": "suite-start", "id": "s1", "title": "Login", "parentId": null}
//! {"event": "test-pass", "id": "t1", "duration": 42}
//! {"event": "log-emitted", "level": "warn", "message": "slow response"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Anomaly;
use crate::tree::{ErrorInfo, LogLevel, TestState};

/// A lifecycle event emitted by the host test runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    RunStart(RunStart),
    SuiteStart(SuiteStart),
    TestStart(TestStart),
    TestPass(TestOutcome),
    TestFail(TestOutcome),
    TestSkip(TestOutcome),
    SuiteEnd(SuiteEnd),
    RunEnd {},
    LogEmitted(LogEmitted),
    ScreenshotEmitted(ScreenshotEmitted),
    ScreenshotCommand(ScreenshotCommand),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStart {
    #[serde(default)]
    pub specs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteStart {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStart {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Payload of test-pass, test-fail and test-skip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub id: String,
    /// Milliseconds
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteEnd {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEmitted {
    #[serde(default)]
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotEmitted {
    pub path: String,
}

/// Screenshot captured by an inspected command, addressed by test id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotCommand {
    pub correlation_id: String,
    /// Base64 image data, optionally prefixed with a `data:` URI header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Accepts any non-negative JSON number; fractional milliseconds are rounded.
/// `null` counts as 0, like an absent field.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(0);
    };
    if !value.is_finite() || value < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "duration must be a non-negative number, got {}",
            value
        )));
    }
    Ok(value.round() as u64)
}

impl Event {
    /// Parse one JSON-encoded event and check its required fields
    pub fn from_json(line: &str) -> Result<Event, Anomaly> {
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| Anomaly::malformed("<unknown>", e.to_string()))?;
        let name = value
            .get("event")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();
        let event: Event =
            serde_json::from_value(value).map_err(|e| Anomaly::malformed(name, e.to_string()))?;
        event.validate()?;
        Ok(event)
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Event::RunStart(_) => "run-start",
            Event::SuiteStart(_) => "suite-start",
            Event::TestStart(_) => "test-start",
            Event::TestPass(_) => "test-pass",
            Event::TestFail(_) => "test-fail",
            Event::TestSkip(_) => "test-skip",
            Event::SuiteEnd(_) => "suite-end",
            Event::RunEnd {} => "run-end",
            Event::LogEmitted(_) => "log-emitted",
            Event::ScreenshotEmitted(_) => "screenshot-emitted",
            Event::ScreenshotCommand(_) => "screenshot-command",
        }
    }

    /// Reject payloads whose required fields are present but unusable
    pub fn validate(&self) -> Result<(), Anomaly> {
        let missing = |field: &str| -> Result<(), Anomaly> {
            Err(Anomaly::malformed(self.name(), format!("empty `{}`", field)))
        };
        match self {
            Event::SuiteStart(SuiteStart { id, .. })
            | Event::TestStart(TestStart { id, .. })
            | Event::TestPass(TestOutcome { id, .. })
            | Event::TestFail(TestOutcome { id, .. })
            | Event::TestSkip(TestOutcome { id, .. })
            | Event::SuiteEnd(SuiteEnd { id, .. })
                if id.is_empty() =>
            {
                missing("id")
            }
            Event::ScreenshotEmitted(ScreenshotEmitted { path }) if path.is_empty() => missing("path"),
            Event::ScreenshotCommand(command) => {
                if command.correlation_id.is_empty() {
                    return missing("correlationId");
                }
                match (&command.data, &command.path) {
                    (Some(_), None) | (None, Some(_)) => Ok(()),
                    _ => Err(Anomaly::malformed(
                        self.name(),
                        "exactly one of `data` or `path` is required",
                    )),
                }
            }
            _ => Ok(()),
        }
    }

    /// Terminal state carried by a status event
    pub fn terminal_state(&self) -> Option<TestState> {
        match self {
            Event::TestPass(_) => Some(TestState::Passed),
            Event::TestFail(_) => Some(TestState::Failed),
            Event::TestSkip(_) => Some(TestState::Skipped),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn run_start<S: Into<String>>(specs: impl IntoIterator<Item = S>) -> Self {
        Event::RunStart(RunStart {
            specs: specs.into_iter().map(Into::into).collect(),
        })
    }

    pub fn suite_start(id: &str, title: &str, parent_id: Option<&str>) -> Self {
        Event::SuiteStart(SuiteStart {
            id: id.to_string(),
            title: title.to_string(),
            parent_id: parent_id.map(str::to_string),
            start: None,
        })
    }

    pub fn test_start(id: &str, title: &str, parent_id: Option<&str>) -> Self {
        Event::TestStart(TestStart {
            id: id.to_string(),
            title: title.to_string(),
            parent_id: parent_id.map(str::to_string),
        })
    }

    pub fn test_pass(id: &str, duration: u64) -> Self {
        Event::TestPass(TestOutcome {
            id: id.to_string(),
            duration,
            error: None,
        })
    }

    pub fn test_fail(id: &str, duration: u64, error: Option<ErrorInfo>) -> Self {
        Event::TestFail(TestOutcome {
            id: id.to_string(),
            duration,
            error,
        })
    }

    pub fn test_skip(id: &str) -> Self {
        Event::TestSkip(TestOutcome {
            id: id.to_string(),
            duration: 0,
            error: None,
        })
    }

    pub fn suite_end(id: &str) -> Self {
        Event::SuiteEnd(SuiteEnd {
            id: id.to_string(),
            end: None,
        })
    }

    pub fn run_end() -> Self {
        Event::RunEnd {}
    }

    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Event::LogEmitted(LogEmitted {
            level,
            message: message.into(),
        })
    }

    pub fn screenshot(path: impl Into<String>) -> Self {
        Event::ScreenshotEmitted(ScreenshotEmitted { path: path.into() })
    }

    pub fn screenshot_data(correlation_id: &str, data: impl Into<String>) -> Self {
        Event::ScreenshotCommand(ScreenshotCommand {
            correlation_id: correlation_id.to_string(),
            data: Some(data.into()),
            path: None,
        })
    }

    pub fn screenshot_file(correlation_id: &str, path: impl Into<String>) -> Self {
        Event::ScreenshotCommand(ScreenshotCommand {
            correlation_id: correlation_id.to_string(),
            data: None,
            path: Some(path.into()),
        })
    }
}
