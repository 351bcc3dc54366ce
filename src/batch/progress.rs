//! Progress reporting for batch runs

use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::BatchSummary;
use crate::config::TargetBox;
use crate::processing::FileOutcome;

/// Receives batch events in scan order
pub trait BatchReporter {
    /// The input directory had no recognised images
    fn no_images(&mut self, dir: &Path);

    fn started(&mut self, total: usize);

    fn file_started(&mut self, name: &str);

    fn file_finished(&mut self, outcome: &FileOutcome, target: TargetBox);

    fn finished(&mut self, summary: &BatchSummary);

    /// Progress bar for work running on the thread pool
    fn progress_bar(&self, total: u64) -> ProgressBar {
        hidden_bar(total)
    }
}

fn hidden_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::hidden();
    pb.set_length(total);
    pb
}

/// Human-readable report on stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    show_progress: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show an indicatif bar while the thread pool works
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

impl BatchReporter for ConsoleReporter {
    fn no_images(&mut self, dir: &Path) {
        println!(
            "{}  No images found in '{}'",
            style("⚠️").yellow(),
            dir.display()
        );
    }

    fn started(&mut self, total: usize) {
        println!();
        println!("🖼️  Resizing {} image(s)...", style(total).bold());
        println!();
    }

    fn file_started(&mut self, name: &str) {
        println!("→ {}", style(name).cyan());
    }

    fn file_finished(&mut self, outcome: &FileOutcome, target: TargetBox) {
        if let Some((width, height)) = outcome.original_dimensions {
            println!("  Original: {}x{}px", width, height);
        }

        match &outcome.result {
            Ok(result) => {
                println!(
                    "  {} Resized to: {}px ({:.1} KB)",
                    style("✅").green(),
                    target,
                    result.output.size_kb()
                );
            }
            Err(message) => {
                println!("  {} Error: {}", style("❌").red(), message);
            }
        }
    }

    fn finished(&mut self, summary: &BatchSummary) {
        println!();
        println!(
            "{} Done: {}/{} image(s) resized",
            style("✅").green().bold(),
            summary.successful,
            summary.total
        );
        println!("   Every image is now {}px", summary.target);
        println!("   The photos now fit the menu cards exactly.");
        println!();
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return hidden_bar(total);
        }

        let pb = ProgressBar::new(total);
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(bar_style.progress_chars("#>-"));
        }
        pb
    }
}

/// Discards every event; used for JSON output
#[derive(Debug, Default)]
pub struct SilentReporter;

impl BatchReporter for SilentReporter {
    fn no_images(&mut self, _dir: &Path) {}

    fn started(&mut self, _total: usize) {}

    fn file_started(&mut self, _name: &str) {}

    fn file_finished(&mut self, _outcome: &FileOutcome, _target: TargetBox) {}

    fn finished(&mut self, _summary: &BatchSummary) {}
}
