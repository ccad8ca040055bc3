//! Error types for tracker calls and command execution.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single call against the issue tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The tracker answered with a non-2xx status.
    #[error("GitHub API {method} {path} failed: {status} {body}")]
    Api {
        /// HTTP method of the failed request.
        method: String,
        /// Request path, including the query string.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Best-effort parsed error body (`{}` when unparsable).
        body: serde_json::Value,
    },

    /// The request never produced a response.
    #[error("GitHub API {method} {path} failed: {source}")]
    Transport {
        /// HTTP method of the failed request.
        method: String,
        /// Request path, including the query string.
        path: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// An error served back from a recorded cassette.
    #[error("{0}")]
    Replayed(String),
}

impl TrackerError {
    /// True when the tracker reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 404,
            Self::Replayed(msg) => msg.contains(" failed: 404 "),
            Self::Transport { .. } => false,
        }
    }

    /// True when a create call failed because the resource already exists.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        let msg = self.to_string();
        msg.contains("already_exists") || msg.contains("Validation Failed")
    }
}

/// Errors surfaced by the `tasksync` commands.
#[derive(Debug, Error)]
pub enum Error {
    /// Argument parsing failed.
    #[error("{0}")]
    Cli(String),

    /// `--owner` or `--repo` was not given.
    #[error("--owner and --repo are required")]
    MissingRepository,

    /// The API base URL cannot carry request paths.
    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(String),

    /// Neither token variable is set.
    #[error("Set GITHUB_TOKEN or GH_TOKEN")]
    MissingToken,

    /// The task file could not be read.
    #[error("Failed to read task file {}: {source}", path.display())]
    ReadTasks {
        /// Path of the task file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The task file is not a valid task list.
    #[error("Failed to parse task file {}: {source}", path.display())]
    ParseTasks {
        /// Path of the task file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The status update file could not be read.
    #[error("Failed to read status updates {}: {source}", path.display())]
    ReadUpdates {
        /// Path of the updates file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The status update file is not a valid mapping.
    #[error("Failed to parse status updates {}: {source}", path.display())]
    ParseUpdates {
        /// Path of the updates file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A planned seed action names a task that is not in the task list.
    #[error("Planned task not found in task list: {0}")]
    UnknownTask(String),

    /// A tracker call failed.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// Reading or writing a cassette failed.
    #[error("{0}")]
    Cassette(String),

    /// The async runtime could not be started.
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
