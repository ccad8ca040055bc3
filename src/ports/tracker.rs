//! Issue tracker port for labels and issues of a single repository.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TrackerError;

/// Boxed future type alias used by [`IssueTracker`] to keep the trait dyn-compatible.
pub type TrackerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TrackerError>> + Send + 'a>>;

/// A label as stored by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Label {
    /// Unique label name (e.g. `status:Done`).
    #[serde(default)]
    pub name: String,
    /// Hex color without the leading `#`.
    #[serde(default)]
    pub color: String,
    /// Free-text description.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

impl Label {
    /// Builds a label from its three attributes.
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), color: color.into(), description: description.into() }
    }
}

/// An issue as returned by the tracker.
///
/// Every field falls back to a default so that an empty or partial
/// response body still decodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Issue {
    /// Tracker-assigned number.
    #[serde(default)]
    pub number: u64,
    /// The issue title, used as the natural key.
    #[serde(default)]
    pub title: String,
    /// The issue body; `null` on the wire becomes empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    /// Attached label names.
    #[serde(default, deserialize_with = "label_names")]
    pub labels: Vec<String>,
    /// `open` or `closed`.
    #[serde(default)]
    pub state: String,
    /// Present when the entity is a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    /// Pull requests share the issues endpoint and are never processed.
    #[must_use]
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Payload for creating an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    /// Title of the new issue.
    pub title: String,
    /// Markdown body.
    pub body: String,
    /// Label names to attach.
    pub labels: Vec<String>,
}

/// Payload for patching an issue's labels and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePatch {
    /// Replacement label set.
    pub labels: Vec<String>,
    /// Replacement body.
    pub body: String,
}

/// Issue state filter for listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    /// Only open issues.
    Open,
    /// Only closed issues.
    Closed,
    /// Open and closed issues.
    All,
}

impl IssueState {
    /// The query-string value for this filter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// One page of an issue listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueQuery {
    /// State filter.
    pub state: IssueState,
    /// 1-based page number.
    pub page: u32,
    /// Page size (the tracker caps this at 100).
    pub per_page: u32,
}

/// Labels and issues of one repository in an external tracker.
///
/// Abstracting the tracker allows deterministic replay and testing
/// without touching the real REST API.
pub trait IssueTracker: Send + Sync {
    /// Fetches a label by exact name, `None` when the tracker reports it missing.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than "not found".
    fn get_label(&self, name: &str) -> TrackerFuture<'_, Option<Label>>;

    /// Creates a label.
    ///
    /// # Errors
    ///
    /// Returns an error if the label cannot be created, including when it already exists.
    fn create_label(&self, label: &Label) -> TrackerFuture<'_, Label>;

    /// Lists one page of issues (pull requests included).
    ///
    /// # Errors
    ///
    /// Returns an error if the issues cannot be listed.
    fn list_issues(&self, query: IssueQuery) -> TrackerFuture<'_, Vec<Issue>>;

    /// Creates an issue and returns it with its assigned number.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be created.
    fn create_issue(&self, issue: &NewIssue) -> TrackerFuture<'_, Issue>;

    /// Replaces the labels and body of an existing issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be found or updated.
    fn update_issue(&self, number: u64, patch: &IssuePatch) -> TrackerFuture<'_, Issue>;
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Labels arrive either as plain names or as label objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelRef {
    Name(String),
    Object {
        #[serde(default)]
        name: String,
    },
}

fn label_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs = Option::<Vec<LabelRef>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(refs
        .into_iter()
        .map(|r| match r {
            LabelRef::Name(name) | LabelRef::Object { name } => name,
        })
        .collect())
}
