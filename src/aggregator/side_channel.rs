//! Per-test buffers for logs and screenshots.
//!
//! Side-channel data is keyed by test id and kept apart from the tree: it
//! may arrive before the test's outcome, or for an id whose test-start
//! could not be placed in the tree. The buffer stays authoritative until
//! run-end, when it is copied onto every matching test node.

use std::collections::HashMap;

use chrono::Utc;

use crate::tree::{LogEntry, LogLevel, ScreenshotRef, ScreenshotSource};

/// Caps applied to each test's buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentLimits {
    pub max_logs: usize,
    pub max_log_length: usize,
    pub max_screenshots: usize,
}

/// Everything buffered for one test id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestAttachments {
    pub logs: Vec<LogEntry>,
    pub screenshots: Vec<ScreenshotRef>,
}

#[derive(Debug, Clone)]
pub struct SideChannels {
    limits: AttachmentLimits,
    by_test: HashMap<String, TestAttachments>,
}

impl SideChannels {
    pub fn new(limits: AttachmentLimits) -> Self {
        Self {
            limits,
            by_test: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.by_test.clear();
    }

    pub fn get(&self, test_id: &str) -> Option<&TestAttachments> {
        self.by_test.get(test_id)
    }

    /// Drop the buffer of one test id
    pub fn remove(&mut self, test_id: &str) -> Option<TestAttachments> {
        self.by_test.remove(test_id)
    }

    /// Buffer a log line. Returns false when the per-test cap dropped it.
    pub fn push_log(&mut self, test_id: &str, level: LogLevel, message: &str) -> bool {
        let limits = self.limits;
        let entry = self.by_test.entry(test_id.to_string()).or_default();
        if entry.logs.len() >= limits.max_logs {
            return false;
        }
        entry
            .logs
            .push(LogEntry::truncated(level, message, limits.max_log_length));
        true
    }

    /// Sequence number the next screenshot of `test_id` would get, or None
    /// once the per-test cap is reached.
    pub fn next_screenshot_seq(&self, test_id: &str) -> Option<usize> {
        let taken = self.by_test.get(test_id).map_or(0, |a| a.screenshots.len());
        (taken < self.limits.max_screenshots).then_some(taken + 1)
    }

    /// Buffer a screenshot, titled by its per-test sequence number.
    /// Returns None when the per-test cap dropped it.
    pub fn push_screenshot(
        &mut self,
        test_id: &str,
        source: ScreenshotSource,
    ) -> Option<&ScreenshotRef> {
        let seq = self.next_screenshot_seq(test_id)?;
        let entry = self.by_test.entry(test_id.to_string()).or_default();
        entry.screenshots.push(ScreenshotRef {
            title: format!("Screenshot {}", seq),
            source,
            timestamp: Utc::now(),
        });
        entry.screenshots.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn channels(max_logs: usize, max_screenshots: usize) -> SideChannels {
        SideChannels::new(AttachmentLimits {
            max_logs,
            max_log_length: 8,
            max_screenshots,
        })
    }

    fn file(name: &str) -> ScreenshotSource {
        ScreenshotSource::File {
            path: PathBuf::from(name),
        }
    }

    #[test]
    fn test_logs_capped_earliest_first() {
        let mut sc = channels(2, 1);
        assert!(sc.push_log("t", LogLevel::Info, "one"));
        assert!(sc.push_log("t", LogLevel::Warn, "two"));
        assert!(!sc.push_log("t", LogLevel::Error, "three"));
        let logs = &sc.get("t").unwrap().logs;
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "one");
        assert_eq!(logs[1].level, LogLevel::Warn);
    }

    #[test]
    fn test_log_messages_truncated() {
        let mut sc = channels(5, 1);
        sc.push_log("t", LogLevel::Info, "0123456789");
        assert_eq!(sc.get("t").unwrap().logs[0].message, "01234567");
    }

    #[test]
    fn test_screenshots_numbered_and_capped() {
        let mut sc = channels(1, 2);
        assert_eq!(sc.push_screenshot("t", file("a.png")).unwrap().title, "Screenshot 1");
        assert_eq!(sc.push_screenshot("t", file("b.png")).unwrap().title, "Screenshot 2");
        assert!(sc.push_screenshot("t", file("c.png")).is_none());
        assert_eq!(sc.next_screenshot_seq("t"), None);
        assert_eq!(sc.next_screenshot_seq("other"), Some(1));
    }

    #[test]
    fn test_buffers_are_per_test() {
        let mut sc = channels(5, 5);
        sc.push_log("a", LogLevel::Info, "for a");
        sc.push_screenshot("b", file("b.png"));
        assert_eq!(sc.get("a").unwrap().screenshots.len(), 0);
        assert_eq!(sc.get("b").unwrap().logs.len(), 0);
        assert_eq!(sc.remove("a").unwrap().logs.len(), 1);
        assert!(sc.get("a").is_none());
        sc.clear();
        assert!(sc.get("b").is_none());
    }
}
