//! Directory walker built on jwalk for parallel traversal.
//!
//! Children of every directory are sorted by file name before they are
//! yielded, so traversal order is stable across runs. Only regular files
//! with a recognized image extension are surfaced; everything else is
//! skipped quietly.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{is_supported_image, ImageFile, ScanError, WalkerConfig};

/// Recursive image discovery over one root directory.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a walker for the given root.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag; when it flips the walk stops early.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build the exclude matcher from a root `.gitignore` plus CLI patterns.
    fn build_gitignore(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);

        let gitignore_path = self.root.join(".gitignore");
        if gitignore_path.exists() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            } else {
                log::debug!("Loaded .gitignore from {}", gitignore_path.display());
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check a path against the exclude matcher.
    ///
    /// Parent directories are consulted as well, so a pattern naming a
    /// directory excludes everything inside it.
    fn should_ignore(&self, path: &Path, is_dir: bool, gitignore: &Option<Gitignore>) -> bool {
        let Some(gi) = gitignore else {
            return false;
        };

        // Gitignore matching expects root-relative paths with forward
        // slashes, even on Windows.
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        let path_str = relative.to_string_lossy();
        let normalized = if cfg!(windows) {
            path_str.replace('\\', "/")
        } else {
            path_str.into_owned()
        };

        gi.matched_path_or_any_parents(normalized, is_dir).is_ignore()
    }

    /// Walk the tree, yielding one item per recognized image.
    ///
    /// Traversal errors are yielded as [`ScanError`] values rather than
    /// stopping iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<ImageFile, ScanError>> + '_ {
        let gitignore = self.build_gitignore();

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("walker: shutdown requested, stopping iteration");
                return None;
            }

            match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    if path == self.root {
                        return None;
                    }

                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return None;
                    }

                    if !is_supported_image(&path) {
                        log::trace!("skipping non-image: {}", path.display());
                        return None;
                    }

                    if self.should_ignore(&path, false, &gitignore) {
                        log::trace!("ignoring file: {}", path.display());
                        return None;
                    }

                    let is_symlink = file_type.is_symlink();
                    if is_symlink && !self.config.follow_symlinks {
                        log::trace!("skipping symlink: {}", path.display());
                        return None;
                    }

                    let metadata = if self.config.follow_symlinks {
                        std::fs::metadata(&path)
                    } else {
                        std::fs::symlink_metadata(&path)
                    };
                    let metadata = match metadata {
                        Ok(m) => m,
                        Err(e) => return Some(self.handle_io_error(&path, e)),
                    };

                    // A symlink target can still turn out to be a directory.
                    if !metadata.is_file() {
                        return None;
                    }

                    // Zero-byte files stay in the listing; the oracle counts
                    // them among its decode failures.
                    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                    Some(Ok(ImageFile {
                        path,
                        size: metadata.len(),
                        modified,
                    }))
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    Some(self.handle_walk_error(path, &e))
                }
            }
        })
    }

    /// Map stat errors onto the scan error taxonomy.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> Result<ImageFile, ScanError> {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                Err(ScanError::PermissionDenied(path.to_path_buf()))
            }
            ErrorKind::NotFound => {
                log::debug!("File vanished during scan: {}", path.display());
                Err(ScanError::NotFound(path.to_path_buf()))
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                Err(ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                })
            }
        }
    }

    fn handle_walk_error(&self, path: PathBuf, error: &jwalk::Error) -> Result<ImageFile, ScanError> {
        log::warn!("Walker error for {}: {}", path.display(), error);
        Err(ScanError::Io {
            path,
            source: std::io::Error::other(error.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::list_images;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    /// Create a directory with a mix of images and noise.
    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        for name in ["b.jpg", "a.png", "notes.txt"] {
            let mut f = File::create(dir.path().join(name)).unwrap();
            writeln!(f, "content of {name}").unwrap();
        }

        let subdir = dir.path().join("nested");
        fs::create_dir(&subdir).unwrap();
        let mut f = File::create(subdir.join("c.WEBP")).unwrap();
        writeln!(f, "webp bytes").unwrap();

        dir
    }

    #[test]
    fn walker_finds_only_images() {
        let dir = create_test_dir();
        let walker = Walker::new(dir.path(), WalkerConfig::default());

        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(files.len(), 3);
        assert!(names.contains(&"a.png".to_string()));
        assert!(names.contains(&"b.jpg".to_string()));
        assert!(names.contains(&"c.WEBP".to_string()));
        for file in &files {
            assert!(file.size > 0);
        }
    }

    #[test]
    fn list_images_sorts_by_path() {
        let dir = create_test_dir();
        let (images, stats) = list_images(dir.path(), WalkerConfig::default(), None, None);

        assert_eq!(stats.images, 3);
        assert_eq!(stats.errors, 0);
        let paths: Vec<_> = images.iter().map(|f| f.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn walker_keeps_zero_byte_files() {
        let dir = create_test_dir();
        File::create(dir.path().join("empty.jpg")).unwrap();

        let (images, stats) = list_images(dir.path(), WalkerConfig::default(), None, None);

        assert_eq!(stats.images, 4);
        assert_eq!(stats.errors, 0);
        let empty = images
            .iter()
            .find(|f| f.path.file_name().unwrap() == "empty.jpg")
            .expect("zero-byte image must appear in the listing");
        assert_eq!(empty.size, 0);
    }

    #[test]
    fn walker_skips_hidden_files_when_asked() {
        let dir = create_test_dir();
        let mut f = File::create(dir.path().join(".hidden.jpg")).unwrap();
        writeln!(f, "hidden").unwrap();

        let config = WalkerConfig {
            skip_hidden: true,
            ..Default::default()
        };
        let walker = Walker::new(dir.path(), config);
        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();

        assert!(files.iter().all(|f| {
            !f.path
                .file_name()
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with('.')
        }));

        // Default keeps hidden entries
        let walker = Walker::new(dir.path(), WalkerConfig::default());
        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
        assert!(files
            .iter()
            .any(|f| f.path.file_name().unwrap() == ".hidden.jpg"));
    }

    #[test]
    fn walker_honors_ignore_patterns() {
        let dir = create_test_dir();
        let thumbs = dir.path().join("thumbnails");
        fs::create_dir(&thumbs).unwrap();
        let mut f = File::create(thumbs.join("thumb.jpg")).unwrap();
        writeln!(f, "small").unwrap();

        let config = WalkerConfig {
            ignore_patterns: vec!["thumbnails/".to_string()],
            ..Default::default()
        };
        let walker = Walker::new(dir.path(), config);
        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();

        assert!(files
            .iter()
            .all(|f| f.path.file_name().unwrap() != "thumb.jpg"));
    }

    #[test]
    fn walker_stops_on_shutdown() {
        let dir = create_test_dir();
        for i in 0..20 {
            let mut f = File::create(dir.path().join(format!("extra{i}.jpg"))).unwrap();
            writeln!(f, "{i}").unwrap();
        }

        let shutdown = Arc::new(AtomicBool::new(true));
        let walker =
            Walker::new(dir.path(), WalkerConfig::default()).with_shutdown_flag(shutdown);

        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
        assert!(files.is_empty());
    }

    #[test]
    fn walker_yields_errors_for_missing_root() {
        let walker = Walker::new(
            Path::new("/nonexistent/path/12345"),
            WalkerConfig::default(),
        );
        let results: Vec<_> = walker.walk().collect();
        assert!(results.is_empty() || results.iter().all(Result::is_err));
    }

    #[test]
    #[cfg(unix)]
    fn walker_skips_symlinks_by_default() {
        use std::os::unix::fs::symlink;

        let dir = create_test_dir();
        symlink(dir.path().join("b.jpg"), dir.path().join("link.jpg")).unwrap();

        let walker = Walker::new(dir.path(), WalkerConfig::default());
        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
        assert!(files
            .iter()
            .all(|f| f.path.file_name().unwrap() != "link.jpg"));

        let config = WalkerConfig {
            follow_symlinks: true,
            ..Default::default()
        };
        let walker = Walker::new(dir.path(), config);
        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
        assert!(files
            .iter()
            .any(|f| f.path.file_name().unwrap() == "link.jpg"));
    }
}
