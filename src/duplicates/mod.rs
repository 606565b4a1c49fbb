//! Duplicate clustering and deletion planning.
//!
//! The similarity oracle reports pairwise relationships ("this image looks
//! like these others"). This module folds those pairs into connected
//! clusters, then plans which member of each cluster survives and which
//! are marked for removal.

pub mod graph;
pub mod planner;

pub use graph::{build_clusters, Cluster, ClusterStats, DuplicateGraph};
pub use planner::{plan, select_representative, ClusterDecision, KeepPolicy, PlanStats};
