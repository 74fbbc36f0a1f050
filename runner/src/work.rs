use itertools::iproduct;
use std::path::{Path, PathBuf};

/// One planner run: a heuristic applied to a single problem file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem<'a> {
    pub heuristic: &'a str,
    pub problem: &'a Path,
}

impl<'a> WorkItem<'a> {
    /// `{heuristic}_{problem}` with the extension stripped and spaces replaced by `-`
    pub fn description(&self, extension: &str) -> String {
        let file_name = self
            .problem
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        let extension = extension.trim_start_matches('.');
        let stem = file_name
            .strip_suffix(extension)
            .and_then(|stem| stem.strip_suffix('.'))
            .unwrap_or(&*file_name);

        format!("{}_{}", self.heuristic, stem.replace(' ', "-"))
    }
}

/// every heuristic paired with every problem, all problems of the first heuristic first
pub fn work_items<'a>(
    heuristics: &'a [String],
    problems: &'a [PathBuf],
) -> impl Iterator<Item = WorkItem<'a>> + 'a {
    iproduct!(heuristics.iter(), problems.iter()).map(|(heuristic, problem)| WorkItem {
        heuristic: heuristic.as_str(),
        problem: problem.as_path(),
    })
}
