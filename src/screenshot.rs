//! Screenshot file handling for save-to-disk mode.
//!
//! The aggregator never touches the filesystem: it decodes image data,
//! picks a destination and queues a [`PendingScreenshot`]. The queue is
//! flushed by the report writer once the run has ended.

use base64::Engine;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// A decoded screenshot waiting to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingScreenshot {
    /// Destination file
    pub path: PathBuf,
    /// PNG bytes
    pub bytes: Vec<u8>,
}

/// Decode base64 image data, accepting an optional `data:<mime>;base64,` header
pub fn decode_image_data(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match data.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(rest, |(_, encoded)| encoded),
        None => data,
    };
    base64::engine::general_purpose::STANDARD.decode(payload.trim())
}

/// Generate a timestamp string safe for file names
pub fn generate_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%.3fZ").to_string()
}

/// File name for the `seq`-th screenshot of a test.
///
/// `capture` counts every file an aggregator has queued. Sanitizing can map
/// distinct test ids onto the same name, so it keeps file names unique.
pub fn screenshot_filename(
    test_id: &str,
    seq: usize,
    capture: usize,
    at: DateTime<Utc>,
) -> String {
    format!(
        "{}_{}_{}_{}.png",
        sanitize_name(test_id),
        seq,
        generate_timestamp(at),
        capture
    )
}

/// Express `path` relative to `base` when it lies below it
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Write queued screenshots, creating parent directories as needed.
/// Returns the number of files written.
pub fn write_pending(pending: &[PendingScreenshot]) -> std::io::Result<usize> {
    for shot in pending {
        if let Some(parent) = shot.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&shot.path, &shot.bytes)?;
    }
    Ok(pending.len())
}

/// Sanitize a name for use in filenames
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}
