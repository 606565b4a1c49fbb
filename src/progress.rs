//! Progress reporting with indicatif.
//!
//! The pipeline runs its phases strictly in sequence (scan, encode, match,
//! remove), so [`Progress`] keeps a single active bar and restyles per phase.
//! Components never talk to indicatif directly; they call the
//! [`ProgressCallback`] trait (and the executor its own callback from
//! `actions::delete`), which keeps them testable with counting stubs.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::actions::delete::{DeletionTally, RemoveProgressCallback};

/// Progress callback for the analysis phases.
///
/// Implement this to observe the pipeline: `scan` (indeterminate), `encode`
/// and `match` (bounded).
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts. `total` is 0 for indeterminate phases.
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called per processed item with a 1-based counter and the item's path.
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the displayed status message.
    fn on_message(&self, _message: &str) {}
}

/// Terminal progress renderer.
pub struct Progress {
    multi: MultiProgress,
    active: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a renderer. With `quiet` set, all callbacks are no-ops.
    /// indicatif itself suppresses drawing when stderr is not a terminal.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            active: Mutex::new(None),
            quiet,
        }
    }

    /// Print a line above the active bar without tearing it.
    pub fn println(&self, line: &str) {
        if self.quiet {
            return;
        }
        let _ = self.multi.println(line);
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style(colors: &str) -> ProgressStyle {
        let template = format!(
            "[{{elapsed_precise}}] [{{bar:40.{colors}}}] {{pos}}/{{len}} ({{percent}}%) {{msg}} (ETA: {{eta}})"
        );
        ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }

    fn start_phase(&self, phase: &str, total: usize) {
        let pb = if total == 0 {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            let colors = match phase {
                "encode" => "cyan/blue",
                _ => "green/blue",
            };
            pb.set_style(Self::bar_style(colors));
            pb
        };
        pb.set_message(phase_label(phase).to_string());
        *self.active.lock().unwrap() = Some(pb);
    }

    fn advance(&self, current: usize, path: &str) {
        if let Some(ref pb) = *self.active.lock().unwrap() {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn finish_phase(&self, phase: &str) {
        if let Some(pb) = self.active.lock().unwrap().take() {
            pb.finish_with_message(format!("{} complete", phase_label(phase)));
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }
        self.start_phase(phase, total);
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }
        self.advance(current, path);
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }
        self.finish_phase(phase);
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        if let Some(ref pb) = *self.active.lock().unwrap() {
            pb.set_message(message.to_string());
        }
    }
}

impl RemoveProgressCallback for Progress {
    fn on_remove_start(&self, total: usize) {
        if self.quiet {
            return;
        }
        self.start_phase("remove", total);
    }

    fn on_before_remove(&self, path: &std::path::Path, index: usize, _total: usize) {
        if self.quiet {
            return;
        }
        self.advance(index + 1, &path.display().to_string());
    }

    fn on_removed(&self, _path: &std::path::Path, _bytes: u64, _backed_up: bool) {}

    fn on_remove_failed(&self, path: &std::path::Path, reason: &str) {
        if self.quiet {
            return;
        }
        self.println(&format!("failed: {} ({})", path.display(), reason));
    }

    fn on_remove_complete(&self, _tally: &DeletionTally) {
        if self.quiet {
            return;
        }
        self.finish_phase("remove");
    }
}

fn phase_label(phase: &str) -> &str {
    match phase {
        "scan" => "Scanning directory",
        "encode" => "Encoding images",
        "match" => "Matching hashes",
        "remove" => "Removing duplicates",
        other => other,
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.len() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if file_name.len() >= max_len {
        // Byte arithmetic can land inside a multibyte character; advance
        // to the next char boundary before slicing.
        let mut start = file_name.len() - max_len + 3;
        while !file_name.is_char_boundary(start) {
            start += 1;
        }
        return format!("...{}", &file_name[start..]);
    }

    format!(".../{}", file_name)
}
