//! Writing a finished report to disk.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::config::ReporterConfig;
use crate::error::ReportResult;
use crate::screenshot::{self, PendingScreenshot};

/// Writes rendered artifacts and queued screenshots under the output directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    config: ReporterConfig,
}

impl ReportWriter {
    pub fn new(config: ReporterConfig) -> Self {
        Self { config }
    }

    /// Write the queued screenshots, then the report itself.
    /// Returns the path of the report file.
    pub fn write(
        &self,
        artifact: impl AsRef<[u8]>,
        screenshots: &[PendingScreenshot],
    ) -> ReportResult<PathBuf> {
        fs::create_dir_all(&self.config.output_dir)?;
        let written = screenshot::write_pending(screenshots)?;

        let report_path = self.config.report_path();
        fs::write(&report_path, artifact)?;
        info!(
            path = %report_path.display(),
            screenshots = written,
            "report generated"
        );
        Ok(report_path)
    }
}
