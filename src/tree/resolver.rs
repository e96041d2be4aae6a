//! Suite reference resolution.
//!
//! Event sources reference suites by unique id or by title, and the two are
//! not distinguishable from the payload. Resolution is a two-tier lookup:
//!
//! 1. a depth-first, pre-order walk from the roots comparing ids; the first
//!    match wins;
//! 2. a title index holding every suite ever created with a given title;
//!    the most recently created one wins.
//!
//! The title tier is a heuristic: two live suites sharing a title are
//! indistinguishable, and the later one shadows the earlier.

use std::collections::HashMap;

use super::types::{SuiteKey, SuiteNode};

/// Lookup-only index over the suites of a tree
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    by_title: HashMap<String, Vec<SuiteKey>>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly created suite under its title
    pub(crate) fn register(&mut self, title: &str, key: SuiteKey) {
        self.by_title.entry(title.to_string()).or_default().push(key);
    }

    pub(crate) fn clear(&mut self) {
        self.by_title.clear();
    }

    /// Resolve `reference` against the suites reachable from `roots`.
    pub fn resolve(
        &self,
        reference: &str,
        suites: &[SuiteNode],
        roots: &[SuiteKey],
    ) -> Option<SuiteKey> {
        find_by_id(reference, suites, roots).or_else(|| self.latest_by_title(reference))
    }

    /// Most recently created suite carrying `title`
    pub fn latest_by_title(&self, title: &str) -> Option<SuiteKey> {
        self.by_title.get(title).and_then(|keys| keys.last().copied())
    }

    /// Number of suites ever registered under `title`
    pub fn title_count(&self, title: &str) -> usize {
        self.by_title.get(title).map_or(0, Vec::len)
    }
}

fn find_by_id(id: &str, suites: &[SuiteNode], roots: &[SuiteKey]) -> Option<SuiteKey> {
    let mut stack: Vec<SuiteKey> = roots.iter().rev().copied().collect();
    while let Some(key) = stack.pop() {
        let suite = &suites[key.0];
        if suite.id == id {
            return Some(key);
        }
        stack.extend(suite.children.iter().rev().copied());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> (Vec<SuiteNode>, Vec<SuiteKey>, IdentityResolver) {
        // root "r" (Shared) -> child "c" (Shared), second root "q" (Other)
        let mut suites = vec![
            SuiteNode::new("r".into(), "Shared".into(), None),
            SuiteNode::new("c".into(), "Shared".into(), Some(SuiteKey(0))),
            SuiteNode::new("q".into(), "Other".into(), None),
        ];
        suites[0].children.push(SuiteKey(1));
        let mut resolver = IdentityResolver::new();
        resolver.register("Shared", SuiteKey(0));
        resolver.register("Shared", SuiteKey(1));
        resolver.register("Other", SuiteKey(2));
        (suites, vec![SuiteKey(0), SuiteKey(2)], resolver)
    }

    #[test]
    fn test_resolves_by_id_first() {
        let (suites, roots, resolver) = arena();
        assert_eq!(resolver.resolve("c", &suites, &roots), Some(SuiteKey(1)));
        assert_eq!(resolver.resolve("q", &suites, &roots), Some(SuiteKey(2)));
    }

    #[test]
    fn test_title_resolves_to_most_recent() {
        let (suites, roots, resolver) = arena();
        assert_eq!(resolver.resolve("Shared", &suites, &roots), Some(SuiteKey(1)));
        assert_eq!(resolver.title_count("Shared"), 2);
    }

    #[test]
    fn test_id_match_beats_title_match() {
        let (mut suites, roots, mut resolver) = arena();
        // a suite titled "r" created later must not shadow the suite whose id is "r"
        suites.push(SuiteNode::new("z".into(), "r".into(), None));
        resolver.register("r", SuiteKey(3));
        assert_eq!(resolver.resolve("r", &suites, &roots), Some(SuiteKey(0)));
    }

    #[test]
    fn test_unknown_reference() {
        let (suites, roots, resolver) = arena();
        assert_eq!(resolver.resolve("missing", &suites, &roots), None);
    }
}
