//! Command-line interface definitions for imgdedup.
//!
//! A single flat command built with the clap derive API: point it at a
//! directory, pick a similarity method and threshold, and optionally let it
//! delete what it finds.
//!
//! # Example
//!
//! ```bash
//! # Analyze only: write JSON/CSV/summary reports, delete nothing
//! imgdedup ~/Pictures
//!
//! # Stricter matching with difference hashing
//! imgdedup ~/Pictures --method dhash --threshold 1
//!
//! # Delete duplicates, keeping a copy of each in ./dups first
//! imgdedup ~/Pictures --delete --backup ./dups
//!
//! # Non-interactive deletion for scripts
//! imgdedup ~/Pictures --delete --yes --json-errors
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::duplicates::KeepPolicy;
use crate::similarity::HashMethod;

/// Duplicate image finder and remover.
///
/// imgdedup scans a directory tree for images, groups near-duplicates by
/// perceptual hash, keeps one representative per group, and can remove the
/// rest. Every run writes JSON, CSV, and text reports of what it found.
#[derive(Debug, Parser)]
#[command(name = "imgdedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan for duplicate images
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Similarity method (falls back to the saved config, then phash)
    #[arg(short, long, value_enum)]
    pub method: Option<HashMethod>,

    /// Maximum Hamming distance to treat two images as duplicates (0-64)
    ///
    /// Lower is stricter; 0 accepts exact hash matches only.
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(0..=64))]
    pub threshold: Option<u32>,

    /// Which image each group keeps
    #[arg(long, value_enum, value_name = "POLICY")]
    pub keep: Option<KeepPolicy>,

    /// Remove the duplicates after analysis
    ///
    /// Without --backup or --yes this asks for confirmation first.
    #[arg(long)]
    pub delete: bool,

    /// Copy each file into DIR before removing it
    #[arg(long, value_name = "DIR", requires = "delete")]
    pub backup: Option<PathBuf>,

    /// Skip the confirmation prompt before deleting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Directory for the JSON/CSV/summary report files
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub report_dir: PathBuf,

    /// Do not write report files
    #[arg(long)]
    pub no_report: bool,

    /// Glob patterns to exclude from the scan (can be repeated)
    ///
    /// These patterns are added to any .gitignore patterns found.
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links during the scan
    ///
    /// Warning: may loop if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Number of threads for decoding and hashing images
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N", default_value = "4")]
    pub io_threads: usize,

    /// Save the method, threshold, and keep policy from this run as defaults
    #[arg(long)]
    pub save_config: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report fatal errors as JSON on stderr (for scripting)
    #[arg(long)]
    pub json_errors: bool,
}
