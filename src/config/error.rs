use std::path::PathBuf;
use thiserror::Error;

/// Problems detected before any external command runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No tasks parsed from --tasks")]
    EmptyTaskList,

    #[error("Too many agents for single-letter IDs: {requested} tasks given, at most {max} supported")]
    CapacityExceeded { requested: usize, max: usize },

    #[error("Invalid task name '{0}': use letters, digits, '.', '_' or '-', starting with a letter or digit, without '..', a trailing '.' or a '.lock' suffix")]
    InvalidTask(String),

    #[error("Task '{0}' appears more than once in --tasks")]
    DuplicateTask(String),

    #[error("Invalid branch prefix '{0}': use letters, digits, '.' or '_' (no '/', '-', '..', trailing '.' or '.lock' suffix)")]
    InvalidBranchPrefix(String),

    #[error("Invalid repository name '{0}'")]
    InvalidRepoName(String),

    #[error("Failed to parse config file {path:?}: {message}")]
    InvalidConfigFile { path: PathBuf, message: String },
}
