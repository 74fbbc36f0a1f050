//! Fixtures shared by the unit tests

use crate::{
    config::SubmitConfig,
    executors::{Executor, ExecutorError, JobRequest},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Benchmark checkout on disk, laid out like the real one
///
/// ```text
/// <tmp>/run_planner
/// <tmp>/benchmark/puzzles/level{n}/...
/// <tmp>/pbs/job.sh
/// <tmp>/pbs/logs/
/// ```
pub struct Fixture {
    pub dir: TempDir,
    pub config: SubmitConfig,
}

impl Fixture {
    pub fn new(levels: &[(u32, &[&str])]) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("pbs");
        fs::create_dir_all(&root).unwrap();
        fs::write(dir.path().join("run_planner"), "#!/bin/sh\n").unwrap();
        fs::write(root.join("job.sh"), "#!/bin/sh\n").unwrap();

        for (level, files) in levels {
            let directory = dir.path().join(format!("benchmark/puzzles/level{level}"));
            fs::create_dir_all(&directory).unwrap();
            for file in files.iter() {
                fs::write(directory.join(file), "").unwrap();
            }
        }

        let mut config = SubmitConfig::default();
        config.benchmark.levels = levels.iter().map(|(level, _)| *level).collect();
        config.heuristics = vec![String::from("A"), String::from("B")];
        let config = config.resolve(&root);
        config.prepare_log_dir().unwrap();

        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// pretend an earlier run already produced the log for `description`
    pub fn touch_log(&self, description: &str) -> PathBuf {
        let log_file = self.config.log_file(description);
        fs::write(&log_file, "").unwrap();

        log_file
    }
}

/// Executor that only records requests, optionally failing at a given call
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub jobs: Vec<JobRequest>,
    pub fail_at: Option<usize>,
}

impl RecordingExecutor {
    pub fn failing_at(call: usize) -> Self {
        Self {
            jobs: Vec::new(),
            fail_at: Some(call),
        }
    }

    pub fn descriptions(&self) -> Vec<&str> {
        self.jobs.iter().map(|job| job.description.as_str()).collect()
    }
}

impl Executor for RecordingExecutor {
    fn submit(&mut self, job: &JobRequest) -> Result<(), ExecutorError> {
        if self.fail_at == Some(self.jobs.len()) {
            return Err(ExecutorError::Exit {
                program: String::from("qsub"),
                code: 1,
            });
        }

        self.jobs.push(job.clone());

        Ok(())
    }
}
