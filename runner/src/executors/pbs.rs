use super::JobRequest;
use crate::config::{ResourceConfig, SubmitConfig};
use std::{ffi::OsString, path::PathBuf};

/// Submits through `qsub` of PBS / Torque
#[derive(Clone, Debug)]
pub struct PbsScheduler {
    pub program: String,
    pub resources: ResourceConfig,
    pub job_script: PathBuf,
}

impl PbsScheduler {
    pub fn load(config: &SubmitConfig) -> Self {
        Self {
            program: config
                .scheduler
                .program
                .clone()
                .unwrap_or_else(|| String::from("qsub")),
            resources: config.resources.clone(),
            job_script: config.job_script.clone(),
        }
    }

    pub fn arguments(&self, job: &JobRequest) -> Vec<OsString> {
        vec![
            OsString::from("-o"),
            job.log_file.clone().into_os_string(),
            // join stderr into stdout
            OsString::from("-j"),
            OsString::from("oe"),
            OsString::from("-N"),
            OsString::from(job.job_name()),
            OsString::from("-l"),
            OsString::from(format!("ncpus={}", self.resources.ncpus)),
            OsString::from("-l"),
            OsString::from(format!("walltime={}", self.resources.walltime)),
            OsString::from("-l"),
            OsString::from(format!("mem={}", self.resources.mem)),
            OsString::from("-v"),
            OsString::from(job.environment()),
            self.job_script.clone().into_os_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qsub_arguments() {
        let mut config = SubmitConfig::default();
        config.job_script = PathBuf::from("/pbs/job.sh");
        let scheduler = PbsScheduler::load(&config);
        let job = JobRequest {
            heuristic: String::from("RGD"),
            problem: PathBuf::from("/bench/level1/a.pwp"),
            description: String::from("RGD_a"),
            log_file: PathBuf::from("/pbs/logs/RGD_a.log"),
        };

        assert_eq!(scheduler.program, "qsub");
        assert_eq!(
            scheduler.arguments(&job),
            vec![
                "-o",
                "/pbs/logs/RGD_a.log",
                "-j",
                "oe",
                "-N",
                "test_RGD_a",
                "-l",
                "ncpus=2",
                "-l",
                "walltime=00:30:00",
                "-l",
                "mem=8GB",
                "-v",
                "HEURISTIC=RGD,PROBLEM=/bench/level1/a.pwp",
                "/pbs/job.sh",
            ]
        );
    }
}
