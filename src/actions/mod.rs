//! Effectful operations on planned duplicates.
//!
//! Everything up to this point is read-only analysis. The delete module is
//! where files actually leave the disk: it walks a plan's removal lists,
//! optionally copying each file into a backup directory first, and keeps
//! going when individual files fail.
//!
//! ```no_run
//! use imgdedup::actions::delete::{execute, ExecutorConfig};
//! use imgdedup::duplicates::ClusterDecision;
//! use imgdedup::progress::Progress;
//! use std::path::PathBuf;
//!
//! let decisions = vec![ClusterDecision {
//!     group_id: 1,
//!     representative: PathBuf::from("/pics/keep.jpg"),
//!     to_remove: vec![PathBuf::from("/pics/copy.jpg")],
//!     reclaimable_bytes: 2048,
//! }];
//!
//! let config = ExecutorConfig::new().with_backup_dir("/pics/.backup");
//! let tally = execute::<Progress>(&decisions, &config, None);
//! println!("{}", tally.summary());
//! ```

pub mod delete;

// Re-export commonly used types
pub use delete::{
    backup_destination, execute, remove_file_with_backup, DeletionTally, ExecutorConfig,
    RemovalError, RemovalOutcome, RemoveProgressCallback, RemovedFile,
};
