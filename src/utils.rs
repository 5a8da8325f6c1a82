//! Filesystem helpers for the run's output area.
//!
//! A run owns one output directory. Before anything touches the page, the
//! area is brought to a known state: the `images/` subdirectory exists and
//! is empty, and reports from earlier runs are gone. Cleanup is per-entry
//! best-effort; a file that cannot be deleted is logged and left behind
//! rather than aborting the run before it starts.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{info, instrument, warn};

/// The resolved output locations of one run.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub root: PathBuf,
    pub images_dir: PathBuf,
}

/// Bring the output area to its known starting state.
///
/// Creates `output_root` and its `images/` subdirectory when missing,
/// empties `images/` when it already exists (files, symlinks and whole
/// subtrees alike), and deletes stale `.xlsx` reports from the root.
///
/// # Returns
///
/// The paths later stages write into. Only the directory creations can
/// fail; deletions are logged and skipped.
#[instrument(level = "info", skip_all, fields(root = %output_root.display()))]
pub fn prepare_output_area(output_root: &Path) -> Result<OutputPaths, Box<dyn Error>> {
    fs::create_dir_all(output_root)?;

    let images_dir = output_root.join("images");
    if images_dir.exists() {
        clean_directory(&images_dir);
    } else {
        fs::create_dir(&images_dir)?;
    }

    remove_stale_reports(output_root)?;

    info!("Output area ready");
    Ok(OutputPaths {
        root: output_root.to_path_buf(),
        images_dir,
    })
}

/// Delete everything inside `dir`, leaving the directory itself.
fn clean_directory(dir: &Path) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, path = %dir.display(), "Unable to list directory for cleanup");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let removal = match entry.file_type() {
            Ok(kind) if kind.is_dir() => fs::remove_dir_all(&path),
            Ok(_) => fs::remove_file(&path),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Unable to inspect entry, skipping");
                continue;
            }
        };
        if let Err(e) = removal {
            warn!(error = %e, path = %path.display(), "Failed to delete, skipping");
        }
    }
}

/// Delete `.xlsx` files left over from earlier runs.
fn remove_stale_reports(dir: &Path) -> Result<(), std::io::Error> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "xlsx") {
            if let Err(e) = fs::remove_file(&path) {
                warn!(error = %e, path = %path.display(), "Failed to delete stale report");
            }
        }
    }
    Ok(())
}

/// Filename for the diagnostic screenshot taken when a run dies.
pub fn screenshot_filename(now: DateTime<Local>) -> String {
    format!("screenshot_{}_page.png", now.format("%d%m%Y_%H%M%S"))
}
