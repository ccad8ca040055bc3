//! Task records read from the local task file.

use std::fmt;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// Default task file location.
pub const DEFAULT_TASKS_PATH: &str = "./gradeup_tasks.json";

/// Status used when a task does not name one.
pub const DEFAULT_STATUS: &str = "Backlog";

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    /// Critical.
    P0,
    /// High; the default.
    #[default]
    P1,
    /// Medium.
    P2,
}

impl Priority {
    /// The priority as written in labels and bodies.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work destined to become one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Issue title; the deduplication key.
    pub title: String,
    /// Priority, `P1` when absent, `null` or empty.
    #[serde(default, deserialize_with = "priority_or_default")]
    pub priority: Priority,
    /// Free-text status, `Backlog` when absent or empty.
    #[serde(default)]
    pub status: Option<String>,
    /// Estimate in points.
    #[serde(default)]
    pub estimate: Option<f64>,
    /// Area tags, in order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub area: Vec<String>,
    /// Acceptance criteria.
    #[serde(default, deserialize_with = "null_as_default")]
    pub acceptance: String,
    /// Free-form notes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
}

impl TaskRecord {
    /// A task with only a title; every other field takes its default.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: Priority::default(),
            status: None,
            estimate: None,
            area: Vec::new(),
            acceptance: String::new(),
            notes: String::new(),
        }
    }

    /// The status to report, falling back to [`DEFAULT_STATUS`].
    #[must_use]
    pub fn status(&self) -> &str {
        self.status.as_deref().filter(|s| !s.is_empty()).unwrap_or(DEFAULT_STATUS)
    }
}

/// Treats an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a priority, treating `null` and `""` as the default.
fn priority_or_default<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(Priority::default()),
        Some("P0") => Ok(Priority::P0),
        Some("P1") => Ok(Priority::P1),
        Some("P2") => Ok(Priority::P2),
        Some(other) => Err(D::Error::unknown_variant(other, &["P0", "P1", "P2"])),
    }
}

/// Parses a JSON task list.
///
/// # Errors
///
/// Returns [`Error::ParseTasks`] if the JSON is not an array of tasks.
pub fn parse_tasks(json: &str, path: &Path) -> Result<Vec<TaskRecord>, Error> {
    serde_json::from_str(json)
        .map_err(|source| Error::ParseTasks { path: path.to_path_buf(), source })
}

/// Reads and parses the task file at `path`.
///
/// # Errors
///
/// Returns [`Error::ReadTasks`] if the file cannot be read and
/// [`Error::ParseTasks`] if it is not a valid task list.
pub fn load_tasks(path: &Path) -> Result<Vec<TaskRecord>, Error> {
    let json = std::fs::read_to_string(path)
        .map_err(|source| Error::ReadTasks { path: path.to_path_buf(), source })?;
    parse_tasks(&json, path)
}
