//! Plain-text summary writer.
//!
//! A short digest of the run for humans: what was scanned, with which
//! settings, and how much space the plan would reclaim. Group-by-group
//! detail stays in the console output and the CSV worklist.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use bytesize::ByteSize;

use crate::report::{RunResult, RunStatus};

use super::ReportError;

/// Write the text summary artifact.
///
/// # Errors
///
/// Returns `ReportError` if writing fails.
pub fn write_summary_text(result: &RunResult, path: &Path) -> Result<(), ReportError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_summary(result, &mut writer)?;
    writer.flush()?;
    log::debug!("Summary written to {}", path.display());
    Ok(())
}

/// Render the summary into any writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_summary<W: Write>(result: &RunResult, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "Duplicate image analysis summary")?;
    writeln!(writer, "{}", "=".repeat(50))?;
    writeln!(writer)?;
    writeln!(
        writer,
        "Analyzed:    {}",
        result.analysis_time.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(
        writer,
        "Directory:   {}",
        result.config.source_directory.display()
    )?;
    writeln!(
        writer,
        "Method:      {} (threshold {})",
        result.config.method, result.config.threshold
    )?;
    writeln!(writer, "Keep policy: {}", result.config.keep_policy)?;
    writeln!(writer)?;

    match result.status {
        RunStatus::NoImages => {
            writeln!(writer, "No supported image files were found.")?;
        }
        RunStatus::NoDuplicates => {
            writeln!(
                writer,
                "No duplicate images were found among {} file(s).",
                result.total_images
            )?;
        }
        RunStatus::Success => {
            writeln!(writer, "Statistics:")?;
            writeln!(writer, "  Images scanned:     {}", result.total_images)?;
            writeln!(writer, "  Duplicate groups:   {}", result.duplicate_groups)?;
            writeln!(writer, "  Images in groups:   {}", result.total_duplicates)?;
            writeln!(writer, "  Marked for removal: {}", result.total_to_remove)?;
            writeln!(writer, "  Remaining after:    {}", result.remaining_images)?;
            if result.scan_errors > 0 {
                writeln!(writer, "  Scan errors:        {}", result.scan_errors)?;
            }
            if result.failed_to_encode > 0 {
                writeln!(writer, "  Unreadable images:  {}", result.failed_to_encode)?;
            }
            writeln!(writer)?;
            writeln!(
                writer,
                "Reclaimable space: {}",
                ByteSize::b(result.reclaimable_bytes)
            )?;

            if let Some(removal) = &result.removal {
                writeln!(writer)?;
                writeln!(writer, "Removal:")?;
                writeln!(writer, "  Removed:   {}", removal.removed)?;
                writeln!(writer, "  Backed up: {}", removal.backed_up)?;
                writeln!(writer, "  Failed:    {}", removal.failed())?;
                writeln!(
                    writer,
                    "  Freed:     {}",
                    ByteSize::b(removal.bytes_freed)
                )?;
                if removal.interrupted {
                    writeln!(writer, "  Interrupted before completion.")?;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::DeletionTally;
    use crate::duplicates::{ClusterDecision, KeepPolicy, PlanStats};
    use crate::report::{RemovalReport, RunConfig};
    use crate::similarity::HashMethod;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config() -> RunConfig {
        RunConfig {
            source_directory: PathBuf::from("/pics"),
            method: HashMethod::Phash,
            threshold: 3,
            keep_policy: KeepPolicy::LargestFile,
        }
    }

    fn render(result: &RunResult) -> String {
        let mut buffer = Vec::new();
        write_summary(result, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn success_summary_lists_the_statistics() {
        let decisions = vec![ClusterDecision {
            group_id: 1,
            representative: PathBuf::from("/pics/keep.jpg"),
            to_remove: vec![PathBuf::from("/pics/copy.jpg")],
            reclaimable_bytes: 2048,
        }];
        let stats = PlanStats {
            groups: 1,
            clustered_images: 2,
            to_remove: 1,
            reclaimable_bytes: 2048,
        };
        let result = RunResult::analysis(
            config(),
            Utc.with_ymd_and_hms(2026, 2, 14, 9, 31, 5).unwrap(),
            12,
            0,
            0,
            &decisions,
            &stats,
        );

        let text = render(&result);
        assert!(text.contains("Duplicate image analysis summary"));
        assert!(text.contains("2026-02-14 09:31:05 UTC"));
        assert!(text.contains("phash (threshold 3)"));
        assert!(text.contains("Images scanned:     12"));
        assert!(text.contains("Duplicate groups:   1"));
        assert!(text.contains("Marked for removal: 1"));
        assert!(text.contains("Remaining after:    11"));
        assert!(text.contains("Reclaimable space:"));
        assert!(!text.contains("Removal:"), "no removal section before execution");
    }

    #[test]
    fn removal_section_appears_once_attached() {
        let result = RunResult::analysis(
            config(),
            Utc::now(),
            5,
            0,
            0,
            &[ClusterDecision {
                group_id: 1,
                representative: PathBuf::from("/pics/keep.jpg"),
                to_remove: vec![PathBuf::from("/pics/copy.jpg")],
                reclaimable_bytes: 100,
            }],
            &PlanStats {
                groups: 1,
                clustered_images: 2,
                to_remove: 1,
                reclaimable_bytes: 100,
            },
        );
        let tally = DeletionTally {
            attempted: 1,
            removed: 1,
            backed_up: 1,
            bytes_freed: 100,
            ..DeletionTally::default()
        };
        let result = result.with_removal(RemovalReport::from_tally(&tally, None));

        let text = render(&result);
        assert!(text.contains("Removal:"));
        assert!(text.contains("Removed:   1"));
        assert!(text.contains("Backed up: 1"));
    }

    #[test]
    fn no_duplicates_summary_is_short() {
        let result = RunResult::analysis(
            config(),
            Utc::now(),
            8,
            0,
            0,
            &[],
            &PlanStats::default(),
        );
        let text = render(&result);
        assert!(text.contains("No duplicate images were found among 8 file(s)."));
        assert!(!text.contains("Statistics:"));
    }

    #[test]
    fn summary_file_round_trips_to_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.txt");
        let result = RunResult::analysis(
            config(),
            Utc::now(),
            0,
            0,
            0,
            &[],
            &PlanStats::default(),
        );

        write_summary_text(&result, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("No supported image files were found."));
    }
}
