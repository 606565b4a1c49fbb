//! Similarity oracle: turns an image listing into a duplicate map.
//!
//! The pipeline only depends on the [`SimilarityOracle`] trait, which maps a
//! set of images to a [`DuplicateMap`] (image → images judged duplicates of
//! it). The built-in implementation is [`perceptual::PerceptualOracle`];
//! alternative backends (a wavelet hasher, an embedding model service) plug
//! in behind the same trait.

pub mod perceptual;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::scanner::ImageFile;

pub use perceptual::{PerceptualOracle, SimilarityIndex};

/// Default maximum Hamming distance when neither CLI nor config set one.
pub const DEFAULT_THRESHOLD: u32 = 3;

/// Duplicate relation produced by an oracle.
///
/// Keyed by image path; the value lists every image the oracle considers a
/// duplicate of the key (possibly empty). The relation is not required to
/// be symmetric, so consumers must union both directions. The ordered map
/// keeps downstream clustering deterministic.
pub type DuplicateMap = BTreeMap<PathBuf, Vec<PathBuf>>;

/// Similarity methods selectable on the command line.
///
/// For the hash-based methods the threshold is an integer maximum Hamming
/// distance in 0-64 over 64-bit hashes: lower is stricter and 0 accepts
/// exact hash matches only. An embedding method (`cnn`) instead takes a
/// similarity cutoff where higher is stricter; the built-in oracle does not
/// implement it (see [`OracleError::UnsupportedMethod`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashMethod {
    /// Perceptual hash (DCT-based) - most resilient to transformations.
    #[default]
    Phash,
    /// Difference hash (gradient-based) - very fast and effective.
    Dhash,
    /// Average hash (mean-based) - fast but less resilient.
    Ahash,
    /// Wavelet hash - not served by the built-in oracle.
    Whash,
    /// Neural-embedding matching - not served by the built-in oracle.
    Cnn,
}

impl HashMethod {
    /// Whether the threshold is interpreted as a Hamming distance.
    #[must_use]
    pub fn is_hash_based(self) -> bool {
        !matches!(self, Self::Cnn)
    }
}

impl std::fmt::Display for HashMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Phash => "phash",
            Self::Dhash => "dhash",
            Self::Ahash => "ahash",
            Self::Whash => "whash",
            Self::Cnn => "cnn",
        };
        write!(f, "{name}")
    }
}

/// Run-level oracle failures. All of these abort the analysis; per-image
/// decode problems are handled inside the oracle and surface only in
/// [`OracleStats`].
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The selected method has no backend in this oracle.
    #[error("method '{0}' is not supported by the built-in oracle (available: phash, dhash, ahash)")]
    UnsupportedMethod(HashMethod),

    /// Threshold outside the valid Hamming distance range.
    #[error("threshold {0} is out of range (expected 0-64)")]
    ThresholdOutOfRange(u32),

    /// The run was interrupted while encoding or matching.
    #[error("similarity analysis interrupted")]
    Interrupted,
}

/// Counters from one oracle pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OracleStats {
    /// Images successfully encoded
    pub encoded: usize,
    /// Images that could not be decoded/hashed (left out of matching)
    pub failed: usize,
    /// Images with at least one duplicate in the resulting map
    pub with_duplicates: usize,
}

/// The pluggable similarity backend.
pub trait SimilarityOracle {
    /// Compute the duplicate relation over `images`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] for run-level failures; per-image problems are
    /// absorbed into the stats instead.
    fn find_duplicates(&self, images: &[ImageFile]) -> Result<(DuplicateMap, OracleStats), OracleError>;

    /// The method this oracle is configured for.
    fn method(&self) -> HashMethod;
}
