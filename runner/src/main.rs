mod collector;
mod config;
mod driver;
mod executors;
#[cfg(test)]
mod testing;
mod work;

use clap::Parser;
use config::{ConfigErrors, SubmitConfig};
use driver::{Driver, DriverOptions, RunError, Summary};
use executors::BatchExecutor;
use std::{env, error::Error, io, path::PathBuf, process::ExitCode};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Submit planner benchmark runs to a batch scheduler, skipping runs that already have a log
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Maximum number of jobs to submit in this run
    submissions: usize,
    /// Resubmit work items even if their log file exists
    #[arg(short, long)]
    force: bool,
    /// Only log the scheduler commands instead of running them
    #[arg(short = 'n', long)]
    dry_run: bool,
    /// YAML config file, built-in defaults are used without one
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Base directory for relative paths in the config [default: current directory]
    #[arg(long)]
    root: Option<PathBuf>,
}

#[derive(Error, Debug)]
enum SubmitError {
    #[error("Failed to determine the working directory")]
    WorkingDirectory(#[source] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigErrors),
    #[error(transparent)]
    Run(#[from] RunError),
}

/// flatten an error and its sources into a single line
fn report(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

fn submit(args: &Args) -> Result<Summary, SubmitError> {
    let cwd = env::current_dir().map_err(SubmitError::WorkingDirectory)?;
    let root = match &args.root {
        Some(root) => cwd.join(root),
        None => cwd,
    };

    let config = SubmitConfig::load(args.config.as_deref())?.resolve(&root);
    config.preflight_checks()?;
    config.prepare_log_dir()?;

    let mut executor = BatchExecutor::load(&config, args.dry_run)?;
    let driver = Driver::load(
        &config,
        DriverOptions {
            budget: args.submissions,
            force: args.force,
        },
    )?;

    info!(
        heuristics = config.heuristics.len(),
        problems = driver.problems().len(),
        "Starting submission"
    );

    let stdout = io::stdout();
    Ok(driver.run(&mut executor, &mut stdout.lock())?)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match submit(&args) {
        Ok(summary) => {
            println!("{summary}");

            ExitCode::SUCCESS
        }
        Err(SubmitError::Run(run_error)) => {
            // counters up to the failed submission are still useful to the caller
            println!("{}", run_error.summary);
            error!("{}", report(&run_error));

            ExitCode::FAILURE
        }
        Err(submit_error) => {
            error!("{}", report(&submit_error));

            ExitCode::FAILURE
        }
    }
}
