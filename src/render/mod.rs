//! Renderers turn a finished result tree into a report artifact.

pub mod json;

pub use json::{JsonRenderer, ReportDocument, SuiteView};

use crate::tree::{ResultTree, RunMetadata};

/// Consumer of the finished tree, invoked exactly once at run-end
pub trait Renderer {
    /// What the renderer produces (a string, bytes, an owned copy...)
    type Artifact;

    type Error: std::error::Error + Send + Sync + 'static;

    fn render(
        &mut self,
        tree: &ResultTree,
        metadata: &RunMetadata,
    ) -> Result<Self::Artifact, Self::Error>;
}

/// Owned copy of a finished run
#[derive(Debug, Clone)]
pub struct RenderedRun {
    pub tree: ResultTree,
    pub metadata: RunMetadata,
}

/// Renderer that hands back the tree and metadata themselves
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotRenderer;

impl Renderer for SnapshotRenderer {
    type Artifact = RenderedRun;
    type Error = std::convert::Infallible;

    fn render(
        &mut self,
        tree: &ResultTree,
        metadata: &RunMetadata,
    ) -> Result<RenderedRun, Self::Error> {
        Ok(RenderedRun {
            tree: tree.clone(),
            metadata: metadata.clone(),
        })
    }
}
