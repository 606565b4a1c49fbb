//! Image discovery: recursive directory traversal and extension filtering.
//!
//! The scanner produces the ordered image listing the rest of the pipeline
//! works from. Submodules:
//! - [`walker`]: parallel directory traversal (jwalk) with gitignore-style
//!   excludes
//!
//! # Example
//!
//! ```no_run
//! use imgdedup::scanner::{list_images, WalkerConfig};
//! use std::path::Path;
//!
//! let (images, stats) = list_images(Path::new("./photos"), WalkerConfig::default(), None, None);
//! println!("{} images ({} unreadable entries)", images.len(), stats.errors);
//! ```

pub mod walker;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::SystemTime;

use crate::progress::ProgressCallback;

pub use walker::Walker;

/// File extensions recognized as images (matched case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Check whether a path carries a recognized image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let lower = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&lower.as_str())
        })
}

/// A discovered image file.
///
/// The path doubles as the image's stable identity for clustering; size and
/// mtime are captured at discovery time for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Path to the image
    pub path: PathBuf,
    /// File size in bytes at discovery time
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl ImageFile {
    /// Create a new `ImageFile`.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
        }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Warning: may loop on symlink cycles.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Glob patterns to exclude (gitignore-style), applied in addition to a
    /// `.gitignore` in the scan root.
    pub ignore_patterns: Vec<String>,
}

impl WalkerConfig {
    /// Build a configuration from CLI arguments.
    #[must_use]
    pub fn new(follow_symlinks: bool, skip_hidden: bool, ignore_patterns: Vec<String>) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
            ignore_patterns,
        }
    }
}

/// Errors surfaced while scanning a directory tree.
///
/// These are per-entry: the walk continues past them and the run is marked
/// partial, never aborted.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The entry disappeared between listing and stat.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing an entry.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Counters from one listing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Recognized images collected
    pub images: usize,
    /// Entries that errored during traversal
    pub errors: usize,
}

/// Walk `root` and return every recognized image, sorted by path.
///
/// Traversal errors are logged and counted in the returned [`ScanStats`];
/// they never abort the listing. The sorted order is what makes group
/// numbering reproducible across runs on unchanged input.
pub fn list_images(
    root: &Path,
    config: WalkerConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Option<&dyn ProgressCallback>,
) -> (Vec<ImageFile>, ScanStats) {
    let mut walker = Walker::new(root, config);
    if let Some(flag) = shutdown_flag {
        walker = walker.with_shutdown_flag(flag);
    }

    if let Some(cb) = progress {
        cb.on_phase_start("scan", 0);
    }

    let mut images = Vec::new();
    let mut stats = ScanStats::default();
    for entry in walker.walk() {
        match entry {
            Ok(image) => {
                if let Some(cb) = progress {
                    cb.on_progress(images.len() + 1, &image.path.display().to_string());
                }
                images.push(image);
            }
            Err(err) => {
                log::warn!("scan: {err}");
                stats.errors += 1;
            }
        }
    }

    images.sort_by(|a, b| a.path.cmp(&b.path));
    stats.images = images.len();

    if let Some(cb) = progress {
        cb.on_phase_end("scan");
    }
    log::info!(
        "Scan complete: {} images under {} ({} errors)",
        stats.images,
        root.display(),
        stats.errors
    );

    (images, stats)
}
