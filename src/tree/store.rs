//! Arena-backed result tree.
//!
//! Suites and tests live in insertion-ordered arenas and refer to each other
//! through [`SuiteKey`]/[`TestKey`] handles. The shape (parents, child order)
//! is fixed when a node is inserted; afterwards only test outcomes,
//! attachments and suite timing change.

use chrono::{DateTime, Utc};

use super::resolver::IdentityResolver;
use super::types::{
    ErrorInfo, SuiteKey, SuiteNode, SuiteStats, TestKey, TestNode, TestState,
};
use crate::error::{Anomaly, ReferenceKind};

/// Reference recorded when a test-start carries no parent at all
pub const NO_PARENT: &str = "<none>";

/// Hierarchical store of suites and tests
#[derive(Debug, Clone, Default)]
pub struct ResultTree {
    suites: Vec<SuiteNode>,
    tests: Vec<TestNode>,
    roots: Vec<SuiteKey>,
    resolver: IdentityResolver,
}

impl ResultTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every node and the identity index
    pub fn clear(&mut self) {
        self.suites.clear();
        self.tests.clear();
        self.roots.clear();
        self.resolver.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Insert a suite under `parent_ref`, or as a root when it has none.
    ///
    /// A parent reference that cannot be resolved still produces a root
    /// suite; the returned anomaly reports the failed lookup.
    pub fn insert_suite(
        &mut self,
        id: &str,
        title: &str,
        parent_ref: Option<&str>,
        provenance: Option<String>,
    ) -> (SuiteKey, Option<Anomaly>) {
        let key = SuiteKey(self.suites.len());
        let (parent, anomaly) = match parent_ref {
            None => (None, None),
            Some(reference) => match self.resolve_suite(reference) {
                Some(parent) => (Some(parent), None),
                None => (
                    None,
                    Some(Anomaly::unresolved(
                        "suite-start",
                        ReferenceKind::SuiteParent,
                        reference,
                    )),
                ),
            },
        };

        let mut node = SuiteNode::new(id.to_string(), title.to_string(), parent);
        node.provenance = provenance;
        self.suites.push(node);
        self.resolver.register(title, key);

        match parent {
            Some(parent) => self.suites[parent.0].children.push(key),
            None => self.roots.push(key),
        }
        (key, anomaly)
    }

    /// Insert a pending test under `parent_ref`.
    ///
    /// Tests are never promoted to roots: without a resolvable suite the
    /// test is not created.
    pub fn insert_test(
        &mut self,
        id: &str,
        title: &str,
        parent_ref: Option<&str>,
    ) -> Result<TestKey, Anomaly> {
        let reference = parent_ref.unwrap_or(NO_PARENT);
        let suite = parent_ref
            .and_then(|reference| self.resolve_suite(reference))
            .ok_or_else(|| Anomaly::unresolved("test-start", ReferenceKind::TestParent, reference))?;

        let key = TestKey(self.tests.len());
        self.tests
            .push(TestNode::pending(id.to_string(), title.to_string(), suite));
        self.suites[suite.0].tests.push(key);
        Ok(key)
    }

    /// Find a test by id. When the id was started more than once, the most
    /// recently inserted test wins.
    pub fn find_test(&self, id: &str) -> Option<TestKey> {
        self.tests.iter().rposition(|test| test.id == id).map(TestKey)
    }

    /// Resolve a suite reference (id first, then most recent title)
    pub fn resolve_suite(&self, reference: &str) -> Option<SuiteKey> {
        self.resolver.resolve(reference, &self.suites, &self.roots)
    }

    /// Move a test to a terminal state.
    ///
    /// A test that is already terminal is overwritten (last write wins) and
    /// the returned anomaly flags the repeat. The error detail is only kept
    /// for failures.
    pub fn set_terminal_state(
        &mut self,
        key: TestKey,
        state: TestState,
        duration: u64,
        error: Option<ErrorInfo>,
    ) -> Option<Anomaly> {
        debug_assert!(state.is_terminal());
        let test = &mut self.tests[key.0];
        let anomaly = test.state.is_terminal().then(|| Anomaly::DuplicateTerminalState {
            id: test.id.clone(),
            previous: test.state,
            next: state,
        });

        test.state = state;
        test.duration = duration;
        test.error = match state {
            TestState::Failed => error,
            _ => None,
        };
        anomaly
    }

    /// Stamp a suite's end and derive its duration from a recorded start
    pub fn close_suite(&mut self, key: SuiteKey, end: DateTime<Utc>) {
        let timing = &mut self.suites[key.0].timing;
        timing.end = Some(end);
        timing.duration = timing
            .start
            .map(|start| (end - start).num_milliseconds().max(0) as u64);
    }

    /// Stamp a suite's start
    pub fn open_suite(&mut self, key: SuiteKey, start: DateTime<Utc>) {
        self.suites[key.0].timing.start = Some(start);
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// Root suites in discovery order
    pub fn roots(&self) -> &[SuiteKey] {
        &self.roots
    }

    pub fn suite(&self, key: SuiteKey) -> &SuiteNode {
        &self.suites[key.0]
    }

    pub fn test(&self, key: TestKey) -> &TestNode {
        &self.tests[key.0]
    }

    pub(crate) fn test_mut(&mut self, key: TestKey) -> &mut TestNode {
        &mut self.tests[key.0]
    }

    /// Child suites of `key` in discovery order
    pub fn children(&self, key: SuiteKey) -> impl Iterator<Item = &SuiteNode> + '_ {
        self.suites[key.0]
            .children
            .iter()
            .map(move |child| &self.suites[child.0])
    }

    /// Tests of `key` in discovery order
    pub fn tests_of(&self, key: SuiteKey) -> impl Iterator<Item = &TestNode> + '_ {
        self.suites[key.0]
            .tests
            .iter()
            .map(move |test| &self.tests[test.0])
    }

    /// Every test in insertion order
    pub fn all_tests(&self) -> impl Iterator<Item = &TestNode> + '_ {
        self.tests.iter()
    }

    pub fn suite_count(&self) -> usize {
        self.suites.len()
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    /// Counts over the suite's own tests
    pub fn stats(&self, key: SuiteKey) -> SuiteStats {
        let mut stats = SuiteStats::default();
        for test in self.tests_of(key) {
            stats.record(test.state);
        }
        stats
    }

    /// Counts over the suite's tests and all nested suites
    pub fn stats_recursive(&self, key: SuiteKey) -> SuiteStats {
        let mut stats = self.stats(key);
        for child in &self.suites[key.0].children {
            stats.merge(self.stats_recursive(*child));
        }
        stats
    }

    /// Chain of titles from the root down to `key`
    pub fn title_path(&self, key: SuiteKey) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = Some(key);
        while let Some(key) = current {
            let suite = &self.suites[key.0];
            path.push(suite.title.as_str());
            current = suite.parent;
        }
        path.reverse();
        path
    }
}
