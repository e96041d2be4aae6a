//! JSON report rendering.

use serde::Serialize;

use super::Renderer;
use crate::tree::{
    ResultTree, RunMetadata, RunSummary, SuiteKey, SuiteStats, SuiteTiming, TestNode,
};

/// Serializable view of one suite and everything nested below it
#[derive(Debug, Serialize)]
pub struct SuiteView<'a> {
    pub id: &'a str,
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<&'a str>,
    pub timing: &'a SuiteTiming,
    pub stats: SuiteStats,
    pub tests: Vec<&'a TestNode>,
    pub suites: Vec<SuiteView<'a>>,
}

impl<'a> SuiteView<'a> {
    pub fn build(tree: &'a ResultTree, key: SuiteKey) -> Self {
        let suite = tree.suite(key);
        Self {
            id: &suite.id,
            title: &suite.title,
            provenance: suite.provenance.as_deref(),
            timing: &suite.timing,
            stats: tree.stats(key),
            tests: tree.tests_of(key).collect(),
            suites: suite
                .child_keys()
                .iter()
                .map(|child| SuiteView::build(tree, *child))
                .collect(),
        }
    }
}

/// Top-level JSON report
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub title: &'a str,
    pub metadata: &'a RunMetadata,
    pub summary: RunSummary,
    pub suites: Vec<SuiteView<'a>>,
}

impl<'a> ReportDocument<'a> {
    pub fn build(title: &'a str, tree: &'a ResultTree, metadata: &'a RunMetadata) -> Self {
        Self {
            title,
            metadata,
            summary: metadata.summary(),
            suites: tree
                .roots()
                .iter()
                .map(|root| SuiteView::build(tree, *root))
                .collect(),
        }
    }
}

/// Renders the run as a JSON document
#[derive(Debug, Clone)]
pub struct JsonRenderer {
    title: String,
    pretty: bool,
}

impl JsonRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pretty: true,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Renderer for JsonRenderer {
    type Artifact = String;
    type Error = serde_json::Error;

    fn render(&mut self, tree: &ResultTree, metadata: &RunMetadata) -> Result<String, Self::Error> {
        let document = ReportDocument::build(&self.title, tree, metadata);
        if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TestState;

    #[test]
    fn test_renders_nested_suites() {
        let mut tree = ResultTree::new();
        tree.insert_suite("r", "Root", None, Some("a.spec".into()));
        tree.insert_suite("c", "Child", Some("r"), None);
        let t = tree.insert_test("t1", "works", Some("c")).unwrap();
        tree.set_terminal_state(t, TestState::Passed, 42, None);

        let mut metadata = RunMetadata::default();
        metadata.counts.passed = 1;

        let json = JsonRenderer::new("Nightly")
            .pretty(false)
            .render(&tree, &metadata)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["title"], "Nightly");
        assert_eq!(value["summary"]["pass_rate"], 100);
        let root = &value["suites"][0];
        assert_eq!(root["provenance"], "a.spec");
        assert_eq!(root["stats"]["tests"], 0);
        let child = &root["suites"][0];
        assert_eq!(child["title"], "Child");
        assert_eq!(child["tests"][0]["state"], "passed");
        assert_eq!(child["tests"][0]["duration"], 42);
    }
}
