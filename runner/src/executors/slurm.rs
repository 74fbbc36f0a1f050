use super::JobRequest;
use crate::config::{ResourceConfig, SubmitConfig};
use std::{ffi::OsString, path::PathBuf};

/// Submits through `sbatch`
///
/// Without `--error` Slurm writes stderr into the `--output` file, so the log holds both.
#[derive(Clone, Debug)]
pub struct SlurmScheduler {
    pub program: String,
    pub resources: ResourceConfig,
    pub job_script: PathBuf,
}

impl SlurmScheduler {
    pub fn load(config: &SubmitConfig) -> Self {
        Self {
            program: config
                .scheduler
                .program
                .clone()
                .unwrap_or_else(|| String::from("sbatch")),
            resources: config.resources.clone(),
            job_script: config.job_script.clone(),
        }
    }

    pub fn arguments(&self, job: &JobRequest) -> Vec<OsString> {
        let mut output = OsString::from("--output=");
        output.push(&job.log_file);

        vec![
            output,
            OsString::from(format!("--job-name={}", job.job_name())),
            OsString::from(format!("--cpus-per-task={}", self.resources.ncpus)),
            OsString::from(format!("--time={}", self.resources.walltime)),
            OsString::from(format!("--mem={}", self.resources.mem)),
            // keep the submitting environment, like qsub does for the job script
            OsString::from(format!("--export=ALL,{}", job.environment())),
            self.job_script.clone().into_os_string(),
        ]
    }
}
