//! Batch driver: scan the input directory and rewrite every image in it

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{Config, TargetBox};
use crate::error::{Result, CardFitError};
use crate::processing::{FileOutcome, ProcessingEngine};

pub mod progress;
pub mod scanner;

pub use progress::*;
pub use scanner::*;

/// Runs the resize-and-pad transformation over a directory
pub struct BatchProcessor {
    engine: ProcessingEngine,
    input_dir: PathBuf,
    jobs: usize,
    config: Config,
}

impl BatchProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            engine: ProcessingEngine::new(config),
            input_dir: config.input_dir.clone(),
            jobs: config.jobs.max(1),
            config: config.clone(),
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Files the next run would rewrite
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        scan_directory(&self.input_dir, &self.config)
    }

    /// Scan and process the input directory.
    ///
    /// Only a missing input directory (or a thread pool that cannot start)
    /// is an error; per-file failures are counted in the summary.
    pub fn run(&self, reporter: &mut dyn BatchReporter) -> Result<BatchSummary> {
        let start_time = Instant::now();
        let files = self.scan()?;
        let target = self.engine.target();

        if files.is_empty() {
            reporter.no_images(&self.input_dir);
            return Ok(BatchSummary::from_outcomes(target, Vec::new()));
        }

        info!("Starting batch of {} file(s) with {} job(s)", files.len(), self.jobs);
        reporter.started(files.len());

        let outcomes = if self.jobs == 1 {
            self.run_sequential(&files, reporter)
        } else {
            self.run_parallel(&files, reporter)?
        };

        let summary = BatchSummary::from_outcomes(target, outcomes);
        reporter.finished(&summary);

        info!(
            "Batch completed: {}/{} in {:.2}s",
            summary.successful,
            summary.total,
            start_time.elapsed().as_secs_f64()
        );

        Ok(summary)
    }

    fn run_sequential(&self, files: &[PathBuf], reporter: &mut dyn BatchReporter) -> Vec<FileOutcome> {
        let target = self.engine.target();

        files
            .iter()
            .map(|path| {
                reporter.file_started(&display_name(path));
                let outcome = self.engine.process_outcome(path);
                reporter.file_finished(&outcome, target);
                outcome
            })
            .collect()
    }

    /// Process on a rayon pool, then report in scan order
    fn run_parallel(
        &self,
        files: &[PathBuf],
        reporter: &mut dyn BatchReporter,
    ) -> Result<Vec<FileOutcome>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| CardFitError::config(format!("Failed to start {} workers: {}", self.jobs, e)))?;

        let progress = reporter.progress_bar(files.len() as u64);

        let outcomes: Vec<FileOutcome> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let outcome = self.engine.process_outcome(path);
                    progress.inc(1);
                    debug!("Worker finished {:?}", path);
                    outcome
                })
                .collect()
        });

        progress.finish_and_clear();

        let target = self.engine.target();
        for outcome in &outcomes {
            reporter.file_started(&outcome.file_name());
            reporter.file_finished(outcome, target);
        }

        Ok(outcomes)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Tally of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub target: TargetBox,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn from_outcomes(target: TargetBox, outcomes: Vec<FileOutcome>) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            successful: 0,
            failed: 0,
            target,
            input_bytes: 0,
            output_bytes: 0,
            outcomes: Vec::new(),
        };

        for outcome in &outcomes {
            match &outcome.result {
                Ok(result) => {
                    summary.successful += 1;
                    summary.input_bytes += result.original.file_size;
                    summary.output_bytes += result.output.file_size;
                }
                Err(_) => summary.failed += 1,
            }
        }

        summary.outcomes = outcomes;
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
