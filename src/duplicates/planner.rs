//! Deletion planning: choose a representative per cluster, mark the rest.
//!
//! Planning is a pure decision step. It never touches the files beyond
//! metadata probes, so a plan can be shown to the user (or written to a
//! report) before anything is removed.
//!
//! # Example
//!
//! ```
//! use imgdedup::duplicates::{plan, Cluster, KeepPolicy};
//! use std::path::PathBuf;
//!
//! let cluster = Cluster::new(vec![
//!     PathBuf::from("/pics/b.jpg"),
//!     PathBuf::from("/pics/a.jpg"),
//! ]);
//! let (decisions, stats) = plan(&[cluster], KeepPolicy::FirstSorted);
//!
//! assert_eq!(decisions[0].group_id, 1);
//! assert_eq!(decisions[0].representative, PathBuf::from("/pics/a.jpg"));
//! assert_eq!(decisions[0].to_remove, vec![PathBuf::from("/pics/b.jpg")]);
//! assert_eq!(stats.to_remove, 1);
//! ```

use std::fmt;
use std::fs;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::graph::Cluster;

/// Policy for choosing which cluster member survives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeepPolicy {
    /// Keep the member with the largest size on disk.
    #[default]
    LargestFile,
    /// Keep the first member in canonical path order.
    FirstSorted,
}

impl fmt::Display for KeepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LargestFile => "largest-file",
            Self::FirstSorted => "first-sorted",
        };
        write!(f, "{name}")
    }
}

/// Planned action for a single cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterDecision {
    /// Stable 1-based group number, assigned in cluster order.
    pub group_id: usize,
    /// The member being kept.
    pub representative: PathBuf,
    /// Members marked for removal, in canonical path order.
    pub to_remove: Vec<PathBuf>,
    /// Bytes freed if every removal succeeds.
    pub reclaimable_bytes: u64,
}

impl ClusterDecision {
    /// Total images in the cluster this decision covers.
    #[must_use]
    pub fn cluster_size(&self) -> usize {
        self.to_remove.len() + 1
    }
}

/// Statistics from deletion planning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanStats {
    /// Number of duplicate groups planned
    pub groups: usize,
    /// Total images across all planned groups
    pub clustered_images: usize,
    /// Files marked for removal
    pub to_remove: usize,
    /// Bytes freed if every removal succeeds
    pub reclaimable_bytes: u64,
}

/// Choose the surviving member of a cluster.
///
/// Under [`KeepPolicy::LargestFile`] the sizes are probed from disk.
/// Members whose size cannot be read are excluded from the comparison;
/// ties keep the first member in path order (only a strictly larger size
/// displaces the current best). If no member's size is readable, the
/// first member in path order is kept so the cluster still resolves.
///
/// # Panics
///
/// Panics if the cluster has no members. Clusters from
/// [`build_clusters`](super::build_clusters) always have at least two.
#[must_use]
pub fn select_representative(cluster: &Cluster, policy: KeepPolicy) -> PathBuf {
    match policy {
        KeepPolicy::FirstSorted => cluster.members[0].clone(),
        KeepPolicy::LargestFile => {
            let mut best: Option<(&PathBuf, u64)> = None;
            for member in &cluster.members {
                let size = match fs::metadata(member) {
                    Ok(meta) => meta.len(),
                    Err(err) => {
                        log::debug!(
                            "Could not read size of {}, excluding from keep selection: {}",
                            member.display(),
                            err
                        );
                        continue;
                    }
                };
                match best {
                    Some((_, best_size)) if size <= best_size => {}
                    _ => best = Some((member, size)),
                }
            }
            match best {
                Some((path, _)) => path.clone(),
                None => {
                    log::debug!(
                        "No member of the {}-image cluster at {} was readable, keeping the first",
                        cluster.len(),
                        cluster.members[0].display()
                    );
                    cluster.members[0].clone()
                }
            }
        }
    }
}

/// Plan removals for a set of clusters.
///
/// Each cluster becomes one [`ClusterDecision`]: the representative chosen
/// by `policy` plus every other member marked for removal. Group ids are
/// 1-based and follow the cluster order, so the same clusters always plan
/// to the same ids.
///
/// # Returns
///
/// A tuple of:
/// - `Vec<ClusterDecision>` - One decision per cluster, in cluster order
/// - `PlanStats` - Totals across all decisions
#[must_use]
pub fn plan(clusters: &[Cluster], policy: KeepPolicy) -> (Vec<ClusterDecision>, PlanStats) {
    let mut decisions = Vec::with_capacity(clusters.len());
    let mut stats = PlanStats::default();

    for (index, cluster) in clusters.iter().enumerate() {
        let representative = select_representative(cluster, policy);
        let to_remove: Vec<PathBuf> = cluster
            .members
            .iter()
            .filter(|member| **member != representative)
            .cloned()
            .collect();
        let reclaimable_bytes: u64 = to_remove
            .iter()
            .map(|path| fs::metadata(path).map_or(0, |meta| meta.len()))
            .sum();

        stats.clustered_images += cluster.len();
        stats.to_remove += to_remove.len();
        stats.reclaimable_bytes += reclaimable_bytes;

        decisions.push(ClusterDecision {
            group_id: index + 1,
            representative,
            to_remove,
            reclaimable_bytes,
        });
    }

    stats.groups = decisions.len();
    log::debug!(
        "Planned {} removals across {} groups ({} bytes reclaimable, keep policy {})",
        stats.to_remove,
        stats.groups,
        stats.reclaimable_bytes,
        policy
    );

    (decisions, stats)
}
