pub mod pbs;
pub mod process;
pub mod slurm;

use crate::config::{ConfigErrors, SubmitConfig};
use itertools::Itertools;
use std::{ffi::OsString, io, path::PathBuf, process::Command};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Failed to spawn {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to wait for {program}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with code {code}")]
    Exit { program: String, code: i32 },
    #[error("{program} was terminated by signal {signal}")]
    Signal { program: String, signal: i32 },
}

/// Everything a scheduler needs to enqueue a single planner run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub heuristic: String,
    pub problem: PathBuf,
    pub description: String,
    pub log_file: PathBuf,
}

impl JobRequest {
    pub fn job_name(&self) -> String {
        format!("test_{}", self.description)
    }

    /// variables for the job script, joined as the schedulers expect them
    pub fn environment(&self) -> String {
        format!(
            "HEURISTIC={},PROBLEM={}",
            self.heuristic,
            self.problem.to_string_lossy()
        )
    }
}

/// Hands a job over to a batch system
///
/// `submit` only returns once the submission itself is done, the job may still be queued.
pub trait Executor {
    fn submit(&mut self, job: &JobRequest) -> Result<(), ExecutorError>;
}

#[derive(Clone, Debug)]
pub enum Schedulers {
    Pbs(pbs::PbsScheduler),
    Slurm(slurm::SlurmScheduler),
}

impl Schedulers {
    pub fn load(config: &SubmitConfig) -> Result<Self, ConfigErrors> {
        match config.scheduler.name.to_lowercase().as_str() {
            "pbs" => Ok(Self::Pbs(pbs::PbsScheduler::load(config))),
            "slurm" => Ok(Self::Slurm(slurm::SlurmScheduler::load(config))),
            _ => Err(ConfigErrors::UnsupportedScheduler(
                config.scheduler.name.clone(),
            )),
        }
    }

    pub fn program(&self) -> &str {
        match self {
            Self::Pbs(scheduler) => &scheduler.program,
            Self::Slurm(scheduler) => &scheduler.program,
        }
    }

    pub fn arguments(&self, job: &JobRequest) -> Vec<OsString> {
        match self {
            Self::Pbs(scheduler) => scheduler.arguments(job),
            Self::Slurm(scheduler) => scheduler.arguments(job),
        }
    }

    pub fn command(&self, job: &JobRequest) -> Command {
        let mut command = Command::new(self.program());
        command.args(self.arguments(job));

        command
    }

    /// printable form of the submission command, only meant for logs
    pub fn render(&self, job: &JobRequest) -> String {
        std::iter::once(self.program().to_string())
            .chain(
                self.arguments(job)
                    .iter()
                    .map(|argument| argument.to_string_lossy().into_owned()),
            )
            .join(" ")
    }
}

/// Executor submitting to the configured scheduler, or only logging with `dry_run`
#[derive(Clone, Debug)]
pub struct BatchExecutor {
    scheduler: Schedulers,
    dry_run: bool,
}

impl BatchExecutor {
    pub fn load(config: &SubmitConfig, dry_run: bool) -> Result<Self, ConfigErrors> {
        Ok(Self {
            scheduler: Schedulers::load(config)?,
            dry_run,
        })
    }
}

impl Executor for BatchExecutor {
    #[tracing::instrument(level = "debug", skip_all, fields(job = %job.description))]
    fn submit(&mut self, job: &JobRequest) -> Result<(), ExecutorError> {
        if self.dry_run {
            info!(command = %self.scheduler.render(job), "Dry run, not submitting");

            return Ok(());
        }

        process::run_blocking(self.scheduler.program(), self.scheduler.command(job))
    }
}
