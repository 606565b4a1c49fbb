//! Run results: the terminal artifact of one invocation.
//!
//! A [`RunResult`] is assembled once after clustering and planning, optionally
//! extended with the removal outcome, and then handed to the report writers
//! and the console summary. It is never mutated afterwards.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::actions::DeletionTally;
use crate::duplicates::{ClusterDecision, KeepPolicy, PlanStats};
use crate::similarity::HashMethod;

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Duplicates were found (and possibly removed).
    Success,
    /// Images were scanned but none were duplicates.
    NoDuplicates,
    /// No supported images were found under the source directory.
    NoImages,
}

/// One duplicate group in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    /// Stable 1-based group number
    pub group_id: usize,
    /// Total images in the group, representative included
    pub total_count: usize,
    /// The image being kept
    pub representative: PathBuf,
    /// Images marked for removal
    pub duplicates: Vec<PathBuf>,
    /// Number of images marked for removal
    pub remove_count: usize,
    /// Bytes freed if every removal in this group succeeds
    pub reclaimable_bytes: u64,
}

impl From<&ClusterDecision> for GroupReport {
    fn from(decision: &ClusterDecision) -> Self {
        Self {
            group_id: decision.group_id,
            total_count: decision.cluster_size(),
            representative: decision.representative.clone(),
            duplicates: decision.to_remove.clone(),
            remove_count: decision.to_remove.len(),
            reclaimable_bytes: decision.reclaimable_bytes,
        }
    }
}

/// A failed removal in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of the removal stage, present once removal has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    /// Where backup copies were written, if backups were requested
    pub backup_dir: Option<PathBuf>,
    /// Files the executor processed
    pub attempted: usize,
    /// Files successfully removed
    pub removed: usize,
    /// Files backed up before removal
    pub backed_up: usize,
    /// Bytes freed by successful removals
    pub bytes_freed: u64,
    /// Failed removals with reasons
    pub failures: Vec<FailureReport>,
    /// Whether removal was cut short by a shutdown request
    pub interrupted: bool,
}

impl RemovalReport {
    /// Build a removal report from an executor tally.
    #[must_use]
    pub fn from_tally(tally: &DeletionTally, backup_dir: Option<PathBuf>) -> Self {
        Self {
            backup_dir,
            attempted: tally.attempted,
            removed: tally.removed,
            backed_up: tally.backed_up,
            bytes_freed: tally.bytes_freed,
            failures: tally
                .failures
                .iter()
                .map(|(path, reason)| FailureReport {
                    path: path.clone(),
                    reason: reason.clone(),
                })
                .collect(),
            interrupted: tally.interrupted,
        }
    }

    /// Number of failed removals.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Run configuration echoed into the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    /// Directory that was scanned
    pub source_directory: PathBuf,
    /// Hashing method used by the similarity oracle
    pub method: HashMethod,
    /// Maximum Hamming distance for a duplicate match
    pub threshold: u32,
    /// Policy that chose each group's representative
    pub keep_policy: KeepPolicy,
}

/// Complete description of one run.
///
/// `remaining_images` is plan-level: the images left if every planned
/// removal succeeds (`total_images - total_to_remove`). The actual removal
/// outcome, including partial failures, lives in `removal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub status: RunStatus,
    /// When the analysis ran
    pub analysis_time: DateTime<Utc>,
    pub config: RunConfig,
    /// Supported images found by the scan
    pub total_images: usize,
    /// Directory entries the scan could not read
    pub scan_errors: usize,
    /// Images the oracle could not decode or hash
    pub failed_to_encode: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Images that belong to some duplicate group
    pub total_duplicates: usize,
    /// Images marked for removal across all groups
    pub total_to_remove: usize,
    /// Images left if every planned removal succeeds
    pub remaining_images: usize,
    /// Bytes freed if every planned removal succeeds
    pub reclaimable_bytes: u64,
    pub groups: Vec<GroupReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal: Option<RemovalReport>,
}

impl RunResult {
    /// Assemble the analysis-stage result from plan decisions.
    ///
    /// The status is derived from what the run saw: no images at all, images
    /// but no duplicates, or at least one duplicate group.
    #[must_use]
    pub fn analysis(
        config: RunConfig,
        analysis_time: DateTime<Utc>,
        total_images: usize,
        scan_errors: usize,
        failed_to_encode: usize,
        decisions: &[ClusterDecision],
        plan_stats: &PlanStats,
    ) -> Self {
        let status = if total_images == 0 {
            RunStatus::NoImages
        } else if decisions.is_empty() {
            RunStatus::NoDuplicates
        } else {
            RunStatus::Success
        };

        Self {
            status,
            analysis_time,
            config,
            total_images,
            scan_errors,
            failed_to_encode,
            duplicate_groups: plan_stats.groups,
            total_duplicates: plan_stats.clustered_images,
            total_to_remove: plan_stats.to_remove,
            remaining_images: total_images.saturating_sub(plan_stats.to_remove),
            reclaimable_bytes: plan_stats.reclaimable_bytes,
            groups: decisions.iter().map(GroupReport::from).collect(),
            removal: None,
        }
    }

    /// Attach the removal outcome once the executor has run.
    #[must_use]
    pub fn with_removal(mut self, removal: RemovalReport) -> Self {
        self.removal = Some(removal);
        self
    }

    /// Check if any duplicates were found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }
}
