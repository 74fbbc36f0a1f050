
use crate::{
    collector::Collector,
    config::{ConfigErrors, SubmitConfig},
    executors::{Executor, ExecutorError, JobRequest},
    work::{work_items, WorkItem},
};
use std::{fmt, io, io::Write, path::PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Counters of a single run, every work item lands in exactly one of them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub submitted: usize,
    pub skipped: usize,
    pub deferred: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.submitted + self.skipped + self.deferred
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Submitted: {}", self.submitted)?;
        writeln!(f, "Skipped from log: {}", self.skipped)?;
        write!(f, "To go: {}", self.deferred)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DriverOptions {
    /// maximum number of scheduler invocations for this run
    pub budget: usize,
    /// resubmit even if a log file exists
    pub force: bool,
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Submission of {description} failed")]
    Submit {
        description: String,
        #[source]
        source: ExecutorError,
    },
    #[error("Failed to report submitted log file")]
    Report(#[from] io::Error),
}

/// A run that stopped early, with the counters up to that point
#[derive(Error, Debug)]
#[error("Run aborted after {} submission(s)", .summary.submitted)]
pub struct RunError {
    pub summary: Summary,
    #[source]
    pub source: DriverError,
}

#[derive(Debug)]
pub enum Disposition {
    Skip,
    Defer,
    Submit(JobRequest),
}

#[derive(Debug)]
pub struct Driver<'a> {
    config: &'a SubmitConfig,
    problems: Vec<PathBuf>,
    options: DriverOptions,
}

impl<'a> Driver<'a> {
    /// discover all problems up front, nothing is submitted if a single one is invalid
    pub fn load(config: &'a SubmitConfig, options: DriverOptions) -> Result<Self, ConfigErrors> {
        let problems = Collector::load(&config.benchmark)?.into_paths();

        Ok(Self::new(config, problems, options))
    }

    pub fn new(config: &'a SubmitConfig, problems: Vec<PathBuf>, options: DriverOptions) -> Self {
        Self {
            config,
            problems,
            options,
        }
    }

    pub fn problems(&self) -> &[PathBuf] {
        &self.problems
    }

    /// decide what happens to the next work item, given the submissions made so far
    ///
    /// An existing log is checked before the budget, so finished work never uses it up.
    pub fn dispose(&self, item: WorkItem<'_>, submitted: usize) -> Disposition {
        let description = item.description(self.config.benchmark.extension());
        let log_file = self.config.log_file(&description);

        if !self.options.force && log_file.exists() {
            debug!(log_file = ?log_file, "Skipping {description}, log exists");
            Disposition::Skip
        } else if submitted >= self.options.budget {
            debug!("Deferring {description}, budget exhausted");
            Disposition::Defer
        } else {
            Disposition::Submit(JobRequest {
                heuristic: item.heuristic.to_string(),
                problem: item.problem.to_path_buf(),
                description,
                log_file,
            })
        }
    }

    /// classify every work item once and submit the ones that are due, one at a time
    ///
    /// The path of each submitted log file is written to `out`.
    #[instrument(skip_all, level = "info", fields(budget = self.options.budget, force = self.options.force))]
    pub fn run<E: Executor, W: Write>(
        &self,
        executor: &mut E,
        out: &mut W,
    ) -> Result<Summary, RunError> {
        let mut summary = Summary::default();

        for item in work_items(&self.config.heuristics, &self.problems) {
            match self.dispose(item, summary.submitted) {
                Disposition::Skip => summary.skipped += 1,
                Disposition::Defer => summary.deferred += 1,
                Disposition::Submit(job) => {
                    if let Err(source) = executor.submit(&job) {
                        return Err(RunError {
                            summary,
                            source: DriverError::Submit {
                                description: job.description,
                                source,
                            },
                        });
                    }
                    summary.submitted += 1;

                    if let Err(source) = writeln!(out, "{}", job.log_file.to_string_lossy())
                        .and_then(|()| out.flush())
                    {
                        return Err(RunError {
                            summary,
                            source: source.into(),
                        });
                    }
                }
            }
        }

        info!(
            submitted = summary.submitted,
            skipped = summary.skipped,
            deferred = summary.deferred,
            total = summary.total(),
            "Done with processing"
        );

        Ok(summary)
    }
}
