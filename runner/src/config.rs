use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Error,
    os::unix::fs::MetadataExt,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, error, warn};

// check if a file is executable
pub fn check_executable(path: &Path) -> Result<bool, ConfigErrors> {
    if !path.is_file() {
        Err(ConfigErrors::FileNotFound(path.to_path_buf()))
    } else {
        fs::metadata(path)
            .map(|metadata| (metadata.mode() & 0o111) != 0)
            .map_err(ConfigErrors::MetadataNotFound)
    }
}

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Failed to read config file {path:?}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: Error,
    },
    #[error("Config file is invalid")]
    InvalidConfig(#[from] serde_yaml::Error),
    #[error("Scheduler not supported: {0}")]
    UnsupportedScheduler(String),
    #[error("File not found: {0:?}")]
    FileNotFound(PathBuf),
    #[error("Metadata not found")]
    MetadataNotFound(#[source] Error),
    #[error("Failed to list problem directory")]
    ProblemDirectory(#[from] ignore::Error),
    #[error("Problem {path:?} does not end with .{extension}")]
    MissingExtension { path: PathBuf, extension: String },
    #[error("Failed to create log directory {path:?}")]
    LogDirectory {
        path: PathBuf,
        #[source]
        source: Error,
    },
    #[error("Preflight checks failed with {0} error(s)")]
    PreflightFailed(usize),
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct SubmitConfig {
    // planner binary, only checked for existence since the job script runs it
    #[serde(default = "default_planner")]
    pub planner: PathBuf,
    // script handed to the scheduler for every job
    #[serde(default = "default_job_script")]
    pub job_script: PathBuf,
    // a `{description}.log` in here marks a work item as attempted
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
    // order matters, the first heuristic gets the budget first
    #[serde(default = "default_heuristics")]
    pub heuristics: Vec<String>,
    #[serde(default)]
    pub resources: ResourceConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkConfig {
    #[serde(default = "default_puzzles")]
    pub puzzles: PathBuf,
    #[serde(default = "default_levels")]
    pub levels: Vec<u32>,
    #[serde(default = "default_extension")]
    pub extension: String,
}

/// Resource limits requested for every submitted job
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    #[serde(default = "default_ncpus")]
    pub ncpus: u32,
    #[serde(default = "default_walltime")]
    pub walltime: String,
    #[serde(default = "default_mem")]
    pub mem: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    // Name of the scheduler, see Schedulers::load for the selection process
    #[serde(default = "default_scheduler")]
    pub name: String,
    // submission command, falls back to the scheduler's usual binary
    pub program: Option<String>,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            planner: default_planner(),
            job_script: default_job_script(),
            log_dir: default_log_dir(),
            benchmark: BenchmarkConfig::default(),
            heuristics: default_heuristics(),
            resources: ResourceConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            puzzles: default_puzzles(),
            levels: default_levels(),
            extension: default_extension(),
        }
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            ncpus: default_ncpus(),
            walltime: default_walltime(),
            mem: default_mem(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: default_scheduler(),
            program: None,
        }
    }
}

impl BenchmarkConfig {
    /// directory holding the problems of a single level
    pub fn level_dir(&self, level: u32) -> PathBuf {
        self.puzzles.join(format!("level{level}"))
    }

    /// mandatory extension without a leading dot
    pub fn extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }
}

impl SubmitConfig {
    /// read the config from a yaml file, or fall back to the built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigErrors> {
        match path {
            Some(path) => {
                debug!(path = ?path, "Loading config");
                let content = fs::read_to_string(path).map_err(|source| {
                    ConfigErrors::ReadConfig {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;

                Ok(serde_yaml::from_str(&content)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// anchor all relative paths at `root`
    pub fn resolve(mut self, root: &Path) -> Self {
        self.planner = root.join(&self.planner);
        self.job_script = root.join(&self.job_script);
        self.log_dir = root.join(&self.log_dir);
        self.benchmark.puzzles = root.join(&self.benchmark.puzzles);

        self
    }

    pub fn log_file(&self, description: &str) -> PathBuf {
        self.log_dir.join(format!("{description}.log"))
    }

    /// create the log directory, including parents, if it is missing
    pub fn prepare_log_dir(&self) -> Result<(), ConfigErrors> {
        fs::create_dir_all(&self.log_dir).map_err(|source| ConfigErrors::LogDirectory {
            path: self.log_dir.clone(),
            source,
        })
    }

    pub fn preflight_checks(&self) -> Result<(), ConfigErrors> {
        // attempt to catch all errors instead of piece-by-piece to make debugging easier for users
        let mut errors = 0;

        match check_executable(&self.planner) {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    "Planner {} is not executable, submitted jobs might fail",
                    self.planner.to_string_lossy()
                );
            }
            Err(e) => {
                error!(
                    "Failed to find planner at {}: {e}",
                    self.planner.to_string_lossy()
                );
                errors += 1;
            }
        }

        if !self.job_script.is_file() {
            error!(
                "Failed to find job_script. Either not a file or not found at {}",
                self.job_script.to_string_lossy()
            );
            errors += 1;
        }

        if self.heuristics.is_empty() {
            error!("No heuristic was defined, unable to build a set of work items");
            errors += 1;
        }

        if self.resources.ncpus == 0 {
            error!("resources.ncpus cannot be 0");
            errors += 1;
        }

        if self.benchmark.extension().is_empty() {
            error!("benchmark.extension cannot be empty");
            errors += 1;
        }

        if errors == 0 {
            Ok(())
        } else {
            Err(ConfigErrors::PreflightFailed(errors))
        }
    }
}

fn default_planner() -> PathBuf {
    PathBuf::from("../run_planner")
}

fn default_job_script() -> PathBuf {
    PathBuf::from("job.sh")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_puzzles() -> PathBuf {
    PathBuf::from("../benchmark/puzzles")
}

fn default_levels() -> Vec<u32> {
    vec![1, 2, 3, 4]
}

fn default_extension() -> String {
    String::from("pwp")
}

fn default_heuristics() -> Vec<String> {
    vec![String::from("RGD"), String::from("N+RGD")]
}

fn default_ncpus() -> u32 {
    2
}

fn default_walltime() -> String {
    String::from("00:30:00")
}

fn default_mem() -> String {
    String::from("8GB")
}

fn default_scheduler() -> String {
    String::from("pbs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn empty_yaml_matches_defaults() {
        let config: SubmitConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config.heuristics, vec!["RGD", "N+RGD"]);
        assert_eq!(config.benchmark.levels, vec![1, 2, 3, 4]);
        assert_eq!(config.benchmark.extension(), "pwp");
        assert_eq!(config.resources, ResourceConfig::default());
        assert_eq!(config.resources.walltime, "00:30:00");
        assert_eq!(config.resources.mem, "8GB");
        assert_eq!(config.scheduler.name, "pbs");
        assert!(config.scheduler.program.is_none());
    }

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let config: SubmitConfig = serde_yaml::from_str(
            "heuristics: [GBFS]\nresources:\n  ncpus: 4\nbenchmark:\n  extension: .pwp\n",
        )
        .unwrap();

        assert_eq!(config.heuristics, vec!["GBFS"]);
        assert_eq!(config.resources.ncpus, 4);
        assert_eq!(config.resources.mem, "8GB");
        assert_eq!(config.benchmark.extension(), "pwp");
        assert_eq!(config.job_script, PathBuf::from("job.sh"));
    }

    #[test]
    fn example_config_parses() {
        let config: SubmitConfig =
            serde_yaml::from_str(include_str!("../submit.example.yml")).unwrap();

        assert_eq!(config.heuristics, default_heuristics());
        assert_eq!(config.resources, ResourceConfig::default());
        assert_eq!(config.benchmark.puzzles, default_puzzles());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<SubmitConfig>("heuristic: [RGD]").is_err());
    }

    #[test]
    fn resolve_anchors_relative_paths_only() {
        let mut config = SubmitConfig::default();
        config.log_dir = PathBuf::from("/var/log/runs");
        let config = config.resolve(Path::new("/work/pbs"));

        assert_eq!(config.job_script, PathBuf::from("/work/pbs/job.sh"));
        assert_eq!(config.planner, PathBuf::from("/work/pbs/../run_planner"));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/runs"));
        assert_eq!(
            config.benchmark.level_dir(3),
            PathBuf::from("/work/pbs/../benchmark/puzzles/level3")
        );
        assert_eq!(
            config.log_file("RGD_a"),
            PathBuf::from("/var/log/runs/RGD_a.log")
        );
    }

    #[test]
    fn preflight_reports_missing_files() {
        let dir = TempDir::new().unwrap();
        let config = SubmitConfig::default().resolve(dir.path());

        assert!(matches!(
            config.preflight_checks(),
            Err(ConfigErrors::PreflightFailed(2))
        ));
    }

    #[test]
    fn preflight_accepts_existing_files() {
        let dir = TempDir::new().unwrap();
        let planner = dir.path().join("run_planner");
        fs::write(&planner, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&planner, fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(dir.path().join("job.sh"), "#!/bin/sh\n").unwrap();

        let mut config = SubmitConfig::default();
        config.planner = PathBuf::from("run_planner");
        let config = config.resolve(dir.path());

        assert!(check_executable(&config.planner).unwrap());
        assert!(config.preflight_checks().is_ok());
    }

    #[test]
    fn log_dir_creation_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut config = SubmitConfig::default();
        config.log_dir = PathBuf::from("nested/logs");
        let config = config.resolve(dir.path());

        config.prepare_log_dir().unwrap();
        config.prepare_log_dir().unwrap();
        assert!(dir.path().join("nested/logs").is_dir());
    }
}
