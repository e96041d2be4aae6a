//! Tracing subscriber setup for the binary.

use std::sync::Once;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, filter::Targets, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ENV_LOG;

static INIT_LOGGER: Once = Once::new();

/// Install a stderr fmt layer filtered by `RUN_REPORT_LOG`.
///
/// An empty or unparseable filter falls back to `debug` when `verbose` is
/// set and `info` otherwise. Later calls are no-ops.
pub fn init(verbose: bool) {
    INIT_LOGGER.call_once(|| {
        let default_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
        let targets = std::env::var(ENV_LOG)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| s.parse::<Targets>().ok())
            .unwrap_or_else(|| Targets::new().with_default(default_level));

        let layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(targets);

        tracing_subscriber::registry().with(layer).init();
    });
}
