//! Report writers for run results.
//!
//! A successful analysis produces three artifacts in the report directory,
//! all sharing one timestamp slug so they sort together:
//!
//! - `duplicate_analysis_<ts>.json` - the full [`RunResult`] for machines
//! - `duplicates_to_remove_<ts>.csv` - one row per file marked for removal
//! - `duplicate_summary_<ts>.txt` - a human-readable digest
//!
//! Runs that find no images or no duplicates write nothing.

pub mod csv;
pub mod json;
pub mod summary;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::report::RunResult;

/// Errors that can occur while writing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// Paths of the artifacts one run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub summary: PathBuf,
}

/// Timestamp slug shared by all artifacts of one run.
#[must_use]
pub fn timestamp_slug(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%d_%H%M%S").to_string()
}

/// Write all three report artifacts into `dir`.
///
/// The directory is created if it does not exist. File names carry the
/// run's analysis timestamp, so repeated runs never overwrite each other.
///
/// # Errors
///
/// Returns `ReportError` if the directory cannot be created or any writer
/// fails.
pub fn write_reports(result: &RunResult, dir: &Path) -> Result<ReportPaths, ReportError> {
    fs::create_dir_all(dir)?;

    let slug = timestamp_slug(&result.analysis_time);
    let paths = ReportPaths {
        json: dir.join(format!("duplicate_analysis_{slug}.json")),
        csv: dir.join(format!("duplicates_to_remove_{slug}.csv")),
        summary: dir.join(format!("duplicate_summary_{slug}.txt")),
    };

    json::write_analysis_json(result, &paths.json)?;
    csv::write_removal_csv(result, &paths.csv)?;
    summary::write_summary_text(result, &paths.summary)?;

    log::info!("Reports written to {}", dir.display());
    Ok(paths)
}
