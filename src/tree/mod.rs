pub mod resolver;
pub mod store;
pub mod types;

pub use resolver::IdentityResolver;
pub use store::ResultTree;
pub use types::{
    ErrorInfo, LogEntry, LogLevel, RunCounts, RunMetadata, RunSummary, ScreenshotRef,
    ScreenshotSource, SuiteKey, SuiteNode, SuiteStats, SuiteTiming, TestKey, TestNode, TestState,
};
