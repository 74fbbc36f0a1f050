use crate::config::{BenchmarkConfig, ConfigErrors};
use ignore::WalkBuilder;
use std::{os::unix::prelude::OsStrExt, path::PathBuf};
use tracing::{debug, info};

/// Problem files of a benchmark, in submission order
///
/// Levels keep the configured order, files inside a level are sorted by name.
#[derive(Debug, Clone)]
pub struct Collector {
    paths: Vec<PathBuf>,
}

impl Collector {
    /// list every configured level directory and check each entry for the mandatory extension
    pub fn load(config: &BenchmarkConfig) -> Result<Self, ConfigErrors> {
        // matched on the raw file name, so multi-part extensions and bare `.pwp` work
        let suffix = format!(".{}", config.extension());
        let mut paths = Vec::new();

        for level in config.levels.iter() {
            let directory = config.level_dir(*level);

            if !directory.is_dir() {
                return Err(ConfigErrors::FileNotFound(directory));
            }

            let walker = WalkBuilder::new(&directory)
                // hidden files and ignore files are problems too
                .standard_filters(false)
                .max_depth(Some(1))
                .sort_by_file_name(|a, b| a.cmp(b))
                .build();

            let before = paths.len();
            for entry in walker {
                let entry = entry?;

                // depth 0 is the level directory itself
                if entry.depth() == 0 {
                    continue;
                }

                let path = entry.into_path();
                let has_suffix = path
                    .file_name()
                    .map_or(false, |name| name.as_bytes().ends_with(suffix.as_bytes()));
                if !has_suffix {
                    return Err(ConfigErrors::MissingExtension {
                        path,
                        extension: config.extension().to_string(),
                    });
                }

                paths.push(path);
            }

            debug!(
                level = level,
                problems = paths.len() - before,
                "Collected level {}",
                directory.to_string_lossy()
            );
        }

        info!("Collected {} problems", paths.len());

        Ok(Self { paths })
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths
    }
}
