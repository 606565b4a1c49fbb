//! Duplicate removal with optional backup.
//!
//! # Overview
//!
//! This module executes a deletion plan:
//! - Permanent removal of every file a plan marked for deletion
//! - Optional copy into a backup directory before each removal
//! - Batch operation with progress reporting
//! - Per-file error handling (one failure never aborts the run)
//!
//! # Safety
//!
//! The backup copy always lands before its file is removed; if the copy
//! fails, the removal is skipped and recorded as a failure. Representatives
//! are never removed, even if a removal list names one.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytesize::ByteSize;
use thiserror::Error;

use crate::duplicates::ClusterDecision;

/// Error type for removal operations.
#[derive(Debug, Error)]
pub enum RemovalError {
    /// File was not found (may have been deleted or moved since analysis).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to remove.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Backup copy failed; the file was left in place.
    #[error("backup copy failed for {path} (to {dest}): {message}")]
    BackupFailed {
        path: PathBuf,
        dest: PathBuf,
        message: String,
    },

    /// A removal list named the file its own cluster keeps.
    #[error("refusing to remove the kept representative: {0}")]
    RepresentativeProtected(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RemovalError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::RepresentativeProtected(p)
            | Self::BackupFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }
}

/// Result of a successful single-file removal.
#[derive(Debug, Clone)]
pub struct RemovedFile {
    /// Path that was removed.
    pub path: PathBuf,
    /// Size of the removed file in bytes.
    pub size: u64,
    /// Where the backup copy landed, if one was made.
    pub backup: Option<PathBuf>,
}

/// Per-file outcome of an attempted removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// File removed without a backup.
    Removed,
    /// File copied into the backup directory, then removed.
    BackedUpAndRemoved,
    /// Removal failed or was refused.
    Failed(String),
}

/// Outcome of a batch removal run.
#[derive(Debug, Clone, Default)]
pub struct DeletionTally {
    /// Files the executor processed (removed or failed).
    pub attempted: usize,
    /// Files successfully removed.
    pub removed: usize,
    /// Files copied into the backup directory before removal.
    pub backed_up: usize,
    /// Bytes freed by successful removals.
    pub bytes_freed: u64,
    /// Failed removals with their reasons.
    pub failures: Vec<(PathBuf, String)>,
    /// Whether the run was cut short by a shutdown request.
    pub interrupted: bool,
}

impl DeletionTally {
    fn record(&mut self, path: &Path, outcome: RemovalOutcome, bytes: u64) {
        self.attempted += 1;
        match outcome {
            RemovalOutcome::Removed => {
                self.removed += 1;
                self.bytes_freed += bytes;
            }
            RemovalOutcome::BackedUpAndRemoved => {
                self.removed += 1;
                self.backed_up += 1;
                self.bytes_freed += bytes;
            }
            RemovalOutcome::Failed(reason) => {
                self.failures.push((path.to_path_buf(), reason));
            }
        }
    }

    /// Number of failed removals.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Check if every processed file was removed and the run completed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty() && !self.interrupted
    }

    /// Human-readable summary of the run.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Removed {} of {} file(s), freed {}",
            self.removed,
            self.attempted,
            ByteSize::b(self.bytes_freed)
        );
        if self.backed_up > 0 {
            text.push_str(&format!(", {} backed up", self.backed_up));
        }
        if !self.failures.is_empty() {
            text.push_str(&format!(", {} failed", self.failures.len()));
        }
        if self.interrupted {
            text.push_str(" (interrupted)");
        }
        text
    }
}

/// Configuration for batch removal.
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Copy each file into this directory before removing it.
    pub backup_dir: Option<PathBuf>,
    /// Cooperative shutdown flag checked between files.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl ExecutorConfig {
    /// Create a config that removes without backups.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Back up every file into `dir` before removing it.
    #[must_use]
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    /// Stop between files once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }
}

/// Callback trait for removal progress reporting.
pub trait RemoveProgressCallback: Send + Sync {
    /// Called once before the first file, with the planned total.
    fn on_remove_start(&self, total: usize);

    /// Called before each file removal.
    fn on_before_remove(&self, path: &Path, index: usize, total: usize);

    /// Called after a successful removal.
    fn on_removed(&self, path: &Path, bytes: u64, backed_up: bool);

    /// Called after a failed removal.
    fn on_remove_failed(&self, path: &Path, reason: &str);

    /// Called when the batch operation completes.
    fn on_remove_complete(&self, tally: &DeletionTally);
}

/// Pick a collision-free destination for a backup copy.
///
/// The copy keeps its original file name when that name is free in the
/// backup directory. Otherwise a counter is inserted before the extension
/// (`photo.jpg` becomes `photo-1.jpg`, then `photo-2.jpg`, ...), so two
/// same-named files from different source directories both survive.
#[must_use]
pub fn backup_destination(backup_dir: &Path, source: &Path) -> PathBuf {
    let file_name = source.file_name().unwrap_or_else(|| "unnamed".as_ref());
    let direct = backup_dir.join(file_name);
    if !direct.exists() {
        return direct;
    }

    let stem = source
        .file_stem()
        .map_or_else(|| "unnamed".to_string(), |s| s.to_string_lossy().into_owned());
    let extension = source.extension().map(|e| e.to_string_lossy().into_owned());

    let mut counter = 1u32;
    loop {
        let name = match &extension {
            Some(ext) => format!("{stem}-{counter}.{ext}"),
            None => format!("{stem}-{counter}"),
        };
        let candidate = backup_dir.join(&name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Remove a single file, copying it into `backup_dir` first when given.
///
/// **WARNING**: Removal is permanent. With a backup directory the copy is
/// written before the file is touched; a failed copy leaves the file in
/// place.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if removal is not allowed
/// - `BackupFailed` if the backup copy fails (file is not removed)
pub fn remove_file_with_backup(
    path: &Path,
    backup_dir: Option<&Path>,
) -> Result<RemovedFile, RemovalError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RemovalError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => RemovalError::PermissionDenied(path.to_path_buf()),
        _ => RemovalError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let size = metadata.len();

    let backup = match backup_dir {
        Some(dir) => {
            let dest = backup_destination(dir, path);
            fs::copy(path, &dest).map_err(|e| {
                log::error!(
                    "Backup copy failed for {} (to {}): {}",
                    path.display(),
                    dest.display(),
                    e
                );
                RemovalError::BackupFailed {
                    path: path.to_path_buf(),
                    dest: dest.clone(),
                    message: e.to_string(),
                }
            })?;
            log::debug!("Backed up {} to {}", path.display(), dest.display());
            Some(dest)
        }
        None => None,
    };

    fs::remove_file(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RemovalError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => RemovalError::PermissionDenied(path.to_path_buf()),
        _ => RemovalError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    log::info!("Removed {} ({} bytes)", path.display(), size);

    Ok(RemovedFile {
        path: path.to_path_buf(),
        size,
        backup,
    })
}

/// Execute a deletion plan.
///
/// Walks every removal list in `decisions`, in order. Each file is handled
/// independently: failures are recorded in the tally and processing moves
/// on, so a single unreadable file never aborts the run. The tally always
/// satisfies `attempted == removed + failed()`.
///
/// With a backup directory configured, the directory is created up front;
/// if that fails, every planned removal is recorded as failed and nothing
/// is deleted.
///
/// # Arguments
///
/// * `decisions` - The plan to execute
/// * `config` - Backup and shutdown configuration
/// * `callback` - Optional progress callback
pub fn execute<C: RemoveProgressCallback>(
    decisions: &[ClusterDecision],
    config: &ExecutorConfig,
    callback: Option<&C>,
) -> DeletionTally {
    let planned: Vec<(&ClusterDecision, &PathBuf)> = decisions
        .iter()
        .flat_map(|decision| decision.to_remove.iter().map(move |path| (decision, path)))
        .collect();
    let total = planned.len();
    let mut tally = DeletionTally::default();

    if let Some(cb) = callback {
        cb.on_remove_start(total);
    }

    let backup_dir = config.backup_dir.as_deref();
    if total > 0 {
        if let Some(dir) = backup_dir {
            if let Err(e) = fs::create_dir_all(dir) {
                log::error!("Cannot create backup directory {}: {}", dir.display(), e);
                let reason = format!("backup directory unavailable: {e}");
                for &(_, path) in &planned {
                    if let Some(cb) = callback {
                        cb.on_remove_failed(path, &reason);
                    }
                    tally.record(path, RemovalOutcome::Failed(reason.clone()), 0);
                }
                if let Some(cb) = callback {
                    cb.on_remove_complete(&tally);
                }
                return tally;
            }
        }
    }

    for (index, &(decision, path)) in planned.iter().enumerate() {
        if let Some(flag) = &config.shutdown_flag {
            if flag.load(Ordering::Relaxed) {
                log::warn!(
                    "Shutdown requested, stopping after {} of {} removals",
                    index,
                    total
                );
                tally.interrupted = true;
                break;
            }
        }

        if let Some(cb) = callback {
            cb.on_before_remove(path, index, total);
        }

        let (outcome, bytes) = if *path == decision.representative {
            let err = RemovalError::RepresentativeProtected(path.clone());
            (RemovalOutcome::Failed(err.to_string()), 0)
        } else {
            match remove_file_with_backup(path, backup_dir) {
                Ok(removed) => {
                    let outcome = if removed.backup.is_some() {
                        RemovalOutcome::BackedUpAndRemoved
                    } else {
                        RemovalOutcome::Removed
                    };
                    (outcome, removed.size)
                }
                Err(err) => (RemovalOutcome::Failed(err.to_string()), 0),
            }
        };

        match &outcome {
            RemovalOutcome::Removed | RemovalOutcome::BackedUpAndRemoved => {
                if let Some(cb) = callback {
                    let backed_up = matches!(outcome, RemovalOutcome::BackedUpAndRemoved);
                    cb.on_removed(path, bytes, backed_up);
                }
            }
            RemovalOutcome::Failed(reason) => {
                log::warn!("Failed to remove {}: {}", path.display(), reason);
                if let Some(cb) = callback {
                    cb.on_remove_failed(path, reason);
                }
            }
        }
        tally.record(path, outcome, bytes);
    }

    if let Some(cb) = callback {
        cb.on_remove_complete(&tally);
    }

    log::info!("{}", tally.summary());

    tally
}
