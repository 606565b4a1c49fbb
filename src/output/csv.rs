//! CSV report writer.
//!
//! Emits the removal worklist: one row per file marked for deletion, for
//! spreadsheet review before anyone passes `--delete`.
//!
//! # Columns
//!
//! - `group_id`: 1-based duplicate group number
//! - `representative`: file name of the image the group keeps
//! - `duplicate`: full path of the file marked for removal
//! - `size_bytes`: current size on disk (0 if the file cannot be probed)

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::report::RunResult;

use super::ReportError;

/// A single row in the removal worklist.
#[derive(Debug, Serialize)]
struct RemovalRow {
    group_id: usize,
    representative: String,
    duplicate: String,
    size_bytes: u64,
}

/// Write the removal worklist CSV artifact.
///
/// # Errors
///
/// Returns `ReportError` if writing or serialization fails.
pub fn write_removal_csv(result: &RunResult, path: &Path) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;

    for group in &result.groups {
        let representative = file_name_of(&group.representative);
        for duplicate in &group.duplicates {
            let size_bytes = fs::metadata(duplicate).map_or(0, |meta| meta.len());
            writer.serialize(RemovalRow {
                group_id: group.group_id,
                representative: representative.clone(),
                duplicate: duplicate.to_string_lossy().into_owned(),
                size_bytes,
            })?;
        }
    }

    writer.flush()?;
    log::debug!("Removal CSV written to {}", path.display());
    Ok(())
}

/// File name component, falling back to the full path display.
fn file_name_of(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::{ClusterDecision, KeepPolicy, PlanStats};
    use crate::report::RunConfig;
    use crate::similarity::HashMethod;
    use chrono::Utc;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn result_for(decisions: Vec<ClusterDecision>, stats: PlanStats) -> RunResult {
        RunResult::analysis(
            RunConfig {
                source_directory: PathBuf::from("/pics"),
                method: HashMethod::Phash,
                threshold: 3,
                keep_policy: KeepPolicy::LargestFile,
            },
            Utc::now(),
            10,
            0,
            0,
            &decisions,
            &stats,
        )
    }

    #[test]
    fn one_row_per_marked_file() {
        let dir = TempDir::new().unwrap();
        let removable = dir.path().join("copy.jpg");
        fs::write(&removable, vec![0u8; 42]).unwrap();

        let decisions = vec![ClusterDecision {
            group_id: 1,
            representative: dir.path().join("keep.jpg"),
            to_remove: vec![removable.clone(), dir.path().join("never-existed.jpg")],
            reclaimable_bytes: 42,
        }];
        let stats = PlanStats {
            groups: 1,
            clustered_images: 3,
            to_remove: 2,
            reclaimable_bytes: 42,
        };

        let path = dir.path().join("worklist.csv");
        write_removal_csv(&result_for(decisions, stats), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3, "header plus two rows");
        assert_eq!(lines[0], "group_id,representative,duplicate,size_bytes");

        // Representative appears as a bare file name, duplicates as full paths.
        assert!(lines[1].starts_with("1,keep.jpg,"));
        assert!(lines[1].contains(removable.to_str().unwrap()));
        assert!(lines[1].ends_with(",42"));

        // Unreadable files fall back to size 0 instead of failing the report.
        assert!(lines[2].ends_with(",0"));
    }

    #[test]
    fn empty_result_writes_no_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("worklist.csv");

        write_removal_csv(&result_for(Vec::new(), PlanStats::default()), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 0);
    }

    #[test]
    fn group_ids_repeat_across_their_rows() {
        let dir = TempDir::new().unwrap();
        let decisions = vec![
            ClusterDecision {
                group_id: 1,
                representative: PathBuf::from("/pics/a.jpg"),
                to_remove: vec![PathBuf::from("/pics/a2.jpg")],
                reclaimable_bytes: 0,
            },
            ClusterDecision {
                group_id: 2,
                representative: PathBuf::from("/pics/b.jpg"),
                to_remove: vec![PathBuf::from("/pics/b2.jpg"), PathBuf::from("/pics/b3.jpg")],
                reclaimable_bytes: 0,
            },
        ];
        let stats = PlanStats {
            groups: 2,
            clustered_images: 5,
            to_remove: 3,
            reclaimable_bytes: 0,
        };

        let path = dir.path().join("worklist.csv");
        write_removal_csv(&result_for(decisions, stats), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let data_lines: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(data_lines.len(), 3);
        assert!(data_lines[0].starts_with("1,"));
        assert!(data_lines[1].starts_with("2,"));
        assert!(data_lines[2].starts_with("2,"));
    }
}
