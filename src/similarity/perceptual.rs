//! Built-in perceptual-hash oracle.
//!
//! Two phases: encode every image to a 64-bit perceptual hash (parallel,
//! bounded I/O pool), then match each image against a BK-tree of all
//! distinct hashes within the configured Hamming distance.
//!
//! Hashes are stable under resizing and recompression, which is exactly the
//! near-duplicate relation the rest of the pipeline clusters on.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bk_tree::{BKTree, Metric};
use image_hasher::{HashAlg, HasherConfig, ImageHash};
use rayon::prelude::*;

use super::{DuplicateMap, HashMethod, OracleError, OracleStats, SimilarityOracle};
use crate::progress::ProgressCallback;
use crate::scanner::ImageFile;

/// Metric comparing `ImageHash` values by Hamming distance.
#[derive(Default, Clone, Copy, Debug)]
pub struct ImageHashMetric;

impl Metric<ImageHash> for ImageHashMetric {
    fn distance(&self, a: &ImageHash, b: &ImageHash) -> u32 {
        a.dist(b)
    }

    fn threshold_distance(&self, a: &ImageHash, b: &ImageHash, threshold: u32) -> Option<u32> {
        let d = self.distance(a, b);
        if d <= threshold {
            Some(d)
        } else {
            None
        }
    }
}

/// BK-tree index over perceptual hashes for within-distance search.
pub struct SimilarityIndex {
    tree: BKTree<ImageHash, ImageHashMetric>,
    count: usize,
}

impl SimilarityIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: BKTree::new(ImageHashMetric),
            count: 0,
        }
    }

    /// Add a hash to the index.
    pub fn insert(&mut self, hash: ImageHash) {
        self.tree.add(hash);
        self.count += 1;
    }

    /// All indexed hashes within `max_distance` of `hash`, with distances.
    pub fn find(&self, hash: &ImageHash, max_distance: u32) -> Vec<(u32, &ImageHash)> {
        self.tree.find(hash, max_distance).collect()
    }

    /// Number of indexed hashes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for SimilarityIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Perceptual-hash similarity oracle.
///
/// Construction validates method and threshold;
/// [`SimilarityOracle::find_duplicates`] runs encode + match. Per-image
/// decode failures are logged, counted, and excluded from matching: an
/// unreadable image can never join a cluster, but it does not abort the run.
pub struct PerceptualOracle {
    hasher: image_hasher::Hasher,
    method: HashMethod,
    threshold: u32,
    io_threads: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for PerceptualOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerceptualOracle")
            .field("method", &self.method)
            .field("threshold", &self.threshold)
            .field("io_threads", &self.io_threads)
            .finish_non_exhaustive()
    }
}

impl PerceptualOracle {
    /// Create an oracle for `method` accepting matches within `threshold`
    /// bits of Hamming distance (0-64; lower is stricter, 0 = exact hash
    /// match only).
    ///
    /// # Errors
    ///
    /// [`OracleError::ThresholdOutOfRange`] for thresholds above 64, and
    /// [`OracleError::UnsupportedMethod`] for `whash`/`cnn`, which have no
    /// backend here.
    pub fn new(method: HashMethod, threshold: u32) -> Result<Self, OracleError> {
        if threshold > 64 {
            return Err(OracleError::ThresholdOutOfRange(threshold));
        }

        let config = match method {
            HashMethod::Phash => HasherConfig::new().hash_alg(HashAlg::Median).preproc_dct(),
            HashMethod::Dhash => HasherConfig::new().hash_alg(HashAlg::Gradient),
            HashMethod::Ahash => HasherConfig::new().hash_alg(HashAlg::Mean),
            HashMethod::Whash | HashMethod::Cnn => {
                return Err(OracleError::UnsupportedMethod(method))
            }
        };

        Ok(Self {
            hasher: config.to_hasher(),
            method,
            threshold,
            io_threads: 4,
            shutdown_flag: None,
            progress_callback: None,
        })
    }

    /// Limit the encode pool to `count` threads (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, count: usize) -> Self {
        self.io_threads = count.max(1);
        self
    }

    /// Set the shutdown flag polled during encode and match.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback for the encode and match phases.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// The configured distance threshold.
    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Decode and hash every image on a bounded pool.
    ///
    /// Output preserves input order; unreadable images yield `None`.
    fn encode_images(&self, images: &[ImageFile]) -> Vec<(PathBuf, Option<ImageHash>)> {
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start("encode", images.len());
        }
        log::info!(
            "Encoding {} images with {} (threshold {})",
            images.len(),
            self.method,
            self.threshold
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.io_threads)
            .build()
            .unwrap_or_else(|_| {
                log::warn!(
                    "Failed to create bounded thread pool, using global pool with {} threads",
                    rayon::current_num_threads()
                );
                rayon::ThreadPoolBuilder::new().build().unwrap()
            });

        let encodings = pool.install(|| {
            images
                .par_iter()
                .enumerate()
                .map(|(idx, file)| {
                    if self.is_shutdown_requested() {
                        return (file.path.clone(), None);
                    }

                    if let Some(ref callback) = self.progress_callback {
                        callback.on_progress(idx + 1, file.path.to_string_lossy().as_ref());
                    }

                    match image::open(&file.path) {
                        Ok(img) => {
                            let hash = self.hasher.hash_image(&img);
                            log::trace!("encoded {}", file.path.display());
                            (file.path.clone(), Some(hash))
                        }
                        Err(e) => {
                            log::warn!("Failed to decode {}: {}", file.path.display(), e);
                            (file.path.clone(), None)
                        }
                    }
                })
                .collect()
        });

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end("encode");
        }

        encodings
    }
}

impl SimilarityOracle for PerceptualOracle {
    fn find_duplicates(&self, images: &[ImageFile]) -> Result<(DuplicateMap, OracleStats), OracleError> {
        let mut stats = OracleStats::default();
        if images.is_empty() {
            return Ok((DuplicateMap::new(), stats));
        }

        let encodings = self.encode_images(images);
        if self.is_shutdown_requested() {
            return Err(OracleError::Interrupted);
        }

        let encoded: Vec<(&PathBuf, &ImageHash)> = encodings
            .iter()
            .filter_map(|(path, hash)| hash.as_ref().map(|h| (path, h)))
            .collect();
        stats.encoded = encoded.len();
        stats.failed = encodings.len() - encoded.len();

        // Index each distinct hash once; owners maps hash bytes back to
        // every path that produced it, so exact copies fan out correctly.
        let mut index = SimilarityIndex::new();
        let mut owners: HashMap<Vec<u8>, Vec<&PathBuf>> = HashMap::new();
        for &(path, hash) in &encoded {
            let entry = owners.entry(hash.as_bytes().to_vec()).or_default();
            if entry.is_empty() {
                index.insert(hash.clone());
            }
            entry.push(path);
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start("match", encoded.len());
        }

        let mut map = DuplicateMap::new();
        for (idx, &(path, hash)) in encoded.iter().enumerate() {
            if self.is_shutdown_requested() {
                return Err(OracleError::Interrupted);
            }
            if let Some(ref callback) = self.progress_callback {
                callback.on_progress(idx + 1, path.to_string_lossy().as_ref());
            }

            let mut duplicates: Vec<PathBuf> = Vec::new();
            for (distance, candidate) in index.find(hash, self.threshold) {
                for owner in &owners[candidate.as_bytes()] {
                    if *owner != path {
                        log::trace!(
                            "match: {} ~ {} (distance {})",
                            path.display(),
                            owner.display(),
                            distance
                        );
                        duplicates.push((*owner).clone());
                    }
                }
            }
            duplicates.sort();
            duplicates.dedup();
            if !duplicates.is_empty() {
                stats.with_duplicates += 1;
            }
            map.insert(path.clone(), duplicates);
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end("match");
        }
        log::info!(
            "Matching complete: {} of {} encoded images have at least one duplicate ({} unreadable)",
            stats.with_duplicates,
            stats.encoded,
            stats.failed
        );

        Ok((map, stats))
    }

    fn method(&self) -> HashMethod {
        self.method
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use std::time::SystemTime;
    use tempfile::tempdir;

    fn image_file(path: &std::path::Path) -> ImageFile {
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        ImageFile::new(path.to_path_buf(), size, SystemTime::now())
    }

    /// Smooth gradient, hash-stable under the configured algorithms.
    fn save_gradient(path: &std::path::Path) {
        let mut img = RgbImage::new(64, 64);
        for x in 0..64 {
            for y in 0..64 {
                let val = ((x + y) * 2) as u8;
                img.put_pixel(x, y, Rgb([val, val, val]));
            }
        }
        img.save(path).unwrap();
    }

    /// Checkerboard, far from the gradient under any hash.
    fn save_checkerboard(path: &std::path::Path) {
        let mut img = RgbImage::new(64, 64);
        for x in 0..64 {
            for y in 0..64 {
                let val = if (x / 8 + y / 8) % 2 == 0 { 255 } else { 0 };
                img.put_pixel(x, y, Rgb([val, val, val]));
            }
        }
        img.save(path).unwrap();
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = PerceptualOracle::new(HashMethod::Phash, 65).unwrap_err();
        assert!(matches!(err, OracleError::ThresholdOutOfRange(65)));
        assert!(PerceptualOracle::new(HashMethod::Phash, 64).is_ok());
        assert!(PerceptualOracle::new(HashMethod::Phash, 0).is_ok());
    }

    #[test]
    fn rejects_methods_without_backend() {
        assert!(matches!(
            PerceptualOracle::new(HashMethod::Whash, 3),
            Err(OracleError::UnsupportedMethod(HashMethod::Whash))
        ));
        assert!(matches!(
            PerceptualOracle::new(HashMethod::Cnn, 3),
            Err(OracleError::UnsupportedMethod(HashMethod::Cnn))
        ));
    }

    #[test]
    fn identical_copies_list_each_other() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        let c = dir.path().join("c.png");
        save_gradient(&a);
        fs::copy(&a, &b).unwrap();
        save_checkerboard(&c);

        let oracle = PerceptualOracle::new(HashMethod::Phash, 0).unwrap();
        let images = vec![image_file(&a), image_file(&b), image_file(&c)];
        let (map, stats) = oracle.find_duplicates(&images).unwrap();

        assert_eq!(stats.encoded, 3);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.with_duplicates, 2);
        assert_eq!(map[&a], vec![b.clone()]);
        assert_eq!(map[&b], vec![a.clone()]);
        assert!(map[&c].is_empty());
    }

    #[test]
    fn unreadable_images_are_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let broken = dir.path().join("broken.png");
        save_gradient(&a);
        fs::write(&broken, b"not an image at all").unwrap();

        let oracle = PerceptualOracle::new(HashMethod::Dhash, 0).unwrap();
        let images = vec![image_file(&a), image_file(&broken)];
        let (map, stats) = oracle.find_duplicates(&images).unwrap();

        assert_eq!(stats.encoded, 1);
        assert_eq!(stats.failed, 1);
        assert!(map.contains_key(&a));
        assert!(!map.contains_key(&broken));
    }

    #[test]
    fn shutdown_interrupts_the_pass() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        save_gradient(&a);

        let flag = Arc::new(AtomicBool::new(true));
        let oracle = PerceptualOracle::new(HashMethod::Ahash, 0)
            .unwrap()
            .with_shutdown_flag(flag);
        let images = vec![image_file(&a)];
        assert!(matches!(
            oracle.find_duplicates(&images),
            Err(OracleError::Interrupted)
        ));
    }

    #[test]
    fn empty_input_yields_empty_map() {
        let oracle = PerceptualOracle::new(HashMethod::Phash, 3).unwrap();
        let (map, stats) = oracle.find_duplicates(&[]).unwrap();
        assert!(map.is_empty());
        assert_eq!(stats, OracleStats::default());
    }

    #[test]
    fn similarity_index_finds_within_distance() {
        let mut index = SimilarityIndex::new();
        assert!(index.is_empty());

        let h1 = ImageHash::from_bytes(&[0, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let h2 = ImageHash::from_bytes(&[0, 0, 0, 0, 0, 0, 0, 1]).unwrap();
        let h3 = ImageHash::from_bytes(&[0xFF; 8]).unwrap();

        index.insert(h1.clone());
        index.insert(h2.clone());
        index.insert(h3.clone());
        assert_eq!(index.len(), 3);

        let matches = index.find(&h1, 1);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().any(|(d, h)| *d == 0 && **h == h1));
        assert!(matches.iter().any(|(d, h)| *d == 1 && **h == h2));
    }
}
