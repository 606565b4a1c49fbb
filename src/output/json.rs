//! JSON report writer.
//!
//! Serializes the full [`RunResult`] for scripting and automation. The
//! analysis-stage artifact omits the `removal` field; it only appears when
//! a result that went through removal is serialized.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "status": "success",
//!   "analysis_time": "2026-02-14T09:31:05Z",
//!   "config": {
//!     "source_directory": "/pics",
//!     "method": "phash",
//!     "threshold": 3,
//!     "keep_policy": "largest-file"
//!   },
//!   "total_images": 10,
//!   "duplicate_groups": 1,
//!   "groups": [
//!     {
//!       "group_id": 1,
//!       "total_count": 2,
//!       "representative": "/pics/keep.jpg",
//!       "duplicates": ["/pics/copy.jpg"],
//!       "reclaimable_bytes": 512
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::report::RunResult;

use super::ReportError;

/// Serialize a run result to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails (unlikely for valid data).
pub fn to_json_pretty(result: &RunResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

/// Write the analysis JSON artifact.
///
/// # Errors
///
/// Returns `ReportError` if serialization or writing fails.
pub fn write_analysis_json(result: &RunResult, path: &Path) -> Result<(), ReportError> {
    let json = to_json_pretty(result)?;
    let mut file = fs::File::create(path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;
    log::debug!("Analysis JSON written to {}", path.display());
    Ok(())
}
