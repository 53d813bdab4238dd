//! Utility functions for log formatting and output directory handling.

use crate::outputs::json::LEDGER_FILE;
use crate::runner::{REPORT_FILE, SCREENSHOT_FILE};
use std::error::Error;
use std::fs as stdfs;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Files a previous run may have left in the output directory.
const RUN_ARTIFACTS: [&str; 3] = [REPORT_FILE, LEDGER_FILE, SCREENSHOT_FILE];

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` characters with an ellipsis and the number
/// of dropped bytes appended. Cuts always land on a character boundary.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Clear a previous run's artifacts from `path`, make sure `images/` exists
/// and is empty, and check the directory is writable.
///
/// Only the report, the ledger, the error screenshot and `images/` are
/// removed; anything else in the directory is left alone. Runs once per
/// process start, never per work item.
///
/// # Errors
///
/// Returns an error if an old artifact cannot be removed, the directories
/// cannot be created, or a probe file cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn reset_output_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    let mut removed = 0usize;
    for name in RUN_ARTIFACTS {
        match fs::remove_file(path.join(name)).await {
            Ok(()) => {
                debug!(file = name, "Removed previous artifact");
                removed += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    let images = path.join("images");
    if fs::try_exists(&images).await? {
        fs::remove_dir_all(&images).await?;
        removed += 1;
    }
    if removed > 0 {
        info!(removed, "Removed previous output");
    }
    fs::create_dir_all(&images).await?;

    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is ready");
    Ok(())
}
