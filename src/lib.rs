//! imgdedup - duplicate image finder and remover.
//!
//! The pipeline runs in strictly separated stages: scan a directory tree for
//! images ([`scanner`]), map them to a duplicate relation with a perceptual
//! hash oracle ([`similarity`]), cluster that relation into groups and pick
//! what to keep ([`duplicates`]), write JSON/CSV/text reports ([`output`]),
//! and only then, when asked, remove the rest ([`actions`]). Planning never
//! touches the filesystem; removal never decides anything.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod signal;
pub mod similarity;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use bytesize::ByteSize;
use chrono::Utc;
use yansi::Paint;

use crate::actions::{execute, ExecutorConfig};
use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{build_clusters, plan, KeepPolicy};
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::report::{RemovalReport, RunConfig, RunResult};
use crate::scanner::{list_images, WalkerConfig};
use crate::similarity::{HashMethod, PerceptualOracle, SimilarityOracle};

/// Run the application with the given CLI arguments.
///
/// Returns the exit code for runs that complete, including the partial and
/// nothing-to-do outcomes. Fatal setup problems (unsupported method, report
/// directory not writable) come back as errors for `main` to report.
///
/// # Errors
///
/// Returns an error if the similarity oracle rejects the configuration, if
/// the analysis is interrupted mid-pass, or if report files cannot be
/// written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let defaults = Config::load();
    let (method, threshold, keep) = merged_settings(&cli, &defaults);
    log::debug!("effective settings: method={method} threshold={threshold} keep={keep}");

    // Constructed before any save below: only settings the oracle accepts
    // are ever persisted as defaults.
    let oracle = PerceptualOracle::new(method, threshold)?.with_io_threads(cli.io_threads);

    if cli.save_config {
        let updated = Config {
            method,
            threshold,
            keep,
        };
        if let Err(e) = updated.save() {
            log::warn!("Could not save defaults: {e}");
        }
    }

    if !cli.path.is_dir() {
        log::error!("Not a directory: {}", cli.path.display());
        return Ok(ExitCode::NoImages);
    }

    let shutdown = signal::install_handler();
    let progress = Arc::new(Progress::new(cli.quiet));

    let walker_config = WalkerConfig::new(
        cli.follow_symlinks,
        cli.skip_hidden,
        cli.ignore_patterns.clone(),
    );
    let (images, scan_stats) = list_images(
        &cli.path,
        walker_config,
        Some(shutdown.get_flag()),
        Some(progress.as_ref()),
    );
    if shutdown.is_shutdown_requested() {
        return Ok(ExitCode::Interrupted);
    }
    if images.is_empty() {
        if !cli.quiet {
            println!(
                "No supported image files found under {}",
                cli.path.display()
            );
        }
        return Ok(ExitCode::NoImages);
    }

    let oracle = oracle
        .with_shutdown_flag(shutdown.get_flag())
        .with_progress_callback(progress.clone());
    let (map, oracle_stats) = oracle.find_duplicates(&images)?;

    let (clusters, cluster_stats) = build_clusters(&map);
    log::debug!(
        "clustered {} related images into {} groups",
        cluster_stats.clustered_images,
        cluster_stats.clusters
    );
    let (decisions, plan_stats) = plan(&clusters, keep);

    let run_config = RunConfig {
        source_directory: cli.path.clone(),
        method,
        threshold,
        keep_policy: keep,
    };
    let mut result = RunResult::analysis(
        run_config,
        Utc::now(),
        images.len(),
        scan_stats.errors,
        oracle_stats.failed,
        &decisions,
        &plan_stats,
    );

    if !cli.quiet {
        print_analysis(&result);
    }

    if !result.has_duplicates() {
        return Ok(exit_code_for(&result));
    }

    // Reports are written before any deletion so the CSV captures file sizes
    // while the files still exist.
    let report_paths = if cli.no_report {
        None
    } else {
        let paths = output::write_reports(&result, &cli.report_dir)?;
        if !cli.quiet {
            println!("\nReports written to {}", cli.report_dir.display());
        }
        Some(paths)
    };

    if cli.delete {
        let proceed = cli.yes || cli.backup.is_some() || confirm_removal(result.total_to_remove)?;
        if proceed {
            let mut exec_config = ExecutorConfig::new().with_shutdown_flag(shutdown.get_flag());
            if let Some(ref dir) = cli.backup {
                exec_config = exec_config.with_backup_dir(dir);
            }

            let tally = execute(&decisions, &exec_config, Some(progress.as_ref()));
            if !cli.quiet {
                println!("{}", tally.summary());
            }
            let interrupted = tally.interrupted;
            result = result.with_removal(RemovalReport::from_tally(&tally, cli.backup.clone()));

            // Refresh the artifacts that carry the removal tally. The CSV is
            // left alone: its sizes were captured before anything was removed.
            if let Some(ref paths) = report_paths {
                output::json::write_analysis_json(&result, &paths.json)?;
                output::summary::write_summary_text(&result, &paths.summary)?;
            }

            if interrupted {
                return Ok(ExitCode::Interrupted);
            }
        } else if !cli.quiet {
            println!("Deletion cancelled; nothing was removed.");
        }
    }

    Ok(exit_code_for(&result))
}

/// Resolve settings with CLI flags winning over saved defaults.
fn merged_settings(cli: &Cli, defaults: &Config) -> (HashMethod, u32, KeepPolicy) {
    (
        cli.method.unwrap_or(defaults.method),
        cli.threshold.unwrap_or(defaults.threshold),
        cli.keep.unwrap_or(defaults.keep),
    )
}

/// Maximum duplicates listed per group on the console.
const GROUP_DETAIL_LIMIT: usize = 3;

/// Print the analysis result to stdout.
fn print_analysis(result: &RunResult) {
    if !result.has_duplicates() {
        println!(
            "No duplicate images found among {} file(s).",
            result.total_images
        );
        return;
    }

    println!("\n{}", "Duplicate analysis results:".bold());
    println!("  Total images:       {}", result.total_images);
    println!("  Duplicate groups:   {}", result.duplicate_groups);
    println!("  Duplicate images:   {}", result.total_duplicates);
    println!("  Marked for removal: {}", result.total_to_remove);
    println!("  Remaining after:    {}", result.remaining_images);
    if result.scan_errors > 0 || result.failed_to_encode > 0 {
        println!(
            "  {} {} unreadable during scan, {} failed to decode",
            "note:".yellow(),
            result.scan_errors,
            result.failed_to_encode
        );
    }

    println!();
    for group in &result.groups {
        println!(
            "{} {} images, {} to remove",
            format!("Group {}:", group.group_id).bold(),
            group.total_count,
            group.remove_count
        );
        println!(
            "  {}   {}",
            "keep".green().bold(),
            group.representative.display()
        );
        for duplicate in group.duplicates.iter().take(GROUP_DETAIL_LIMIT) {
            println!("  {} {}", "remove".red(), duplicate.display());
        }
        if group.duplicates.len() > GROUP_DETAIL_LIMIT {
            println!("  ... and {} more", group.duplicates.len() - GROUP_DETAIL_LIMIT);
        }
    }

    println!(
        "\nReclaimable space: {}",
        ByteSize::b(result.reclaimable_bytes).to_string().cyan().bold()
    );
}

/// Ask for confirmation before deleting without a backup.
///
/// Anything other than an explicit yes declines, including EOF on a closed
/// stdin.
fn confirm_removal(count: usize) -> io::Result<bool> {
    print!("About to permanently delete {count} file(s) with no backup. Continue? (y/N): ");
    io::stdout().flush()?;

    let mut reply = String::new();
    io::stdin().read_line(&mut reply)?;
    Ok(is_affirmative(&reply))
}

fn is_affirmative(reply: &str) -> bool {
    matches!(reply.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Map a finished run onto its exit code.
///
/// Per-file trouble anywhere (scan, decode, removal) turns an otherwise
/// clean run into a partial success.
fn exit_code_for(result: &RunResult) -> ExitCode {
    use crate::report::RunStatus;

    let removal_failures = result.removal.as_ref().map_or(0, RemovalReport::failed);
    if result.status == RunStatus::NoImages {
        ExitCode::NoImages
    } else if result.scan_errors > 0 || result.failed_to_encode > 0 || removal_failures > 0 {
        ExitCode::PartialSuccess
    } else if !result.has_duplicates() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    }
}
