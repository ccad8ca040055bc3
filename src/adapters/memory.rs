//! In-memory issue tracker for workflow tests and offline runs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::json;

use crate::error::TrackerError;
use crate::ports::{
    Issue, IssuePatch, IssueQuery, IssueState, IssueTracker, Label, NewIssue, TrackerFuture,
};

/// Thread-safe in-memory tracker mimicking the GitHub issues API.
///
/// Clones share state, so a test can keep a handle while the workflow
/// owns a boxed copy.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTracker {
    state: Arc<Mutex<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    labels: BTreeMap<String, Label>,
    issues: Vec<Issue>,
    /// Labels that read as missing but fail creation as already existing.
    racing_labels: BTreeSet<String>,
    /// Labels whose creation fails with the given status.
    rejected_labels: BTreeMap<String, u16>,
    /// Status returned for every label lookup, when set.
    label_lookup_failure: Option<u16>,
    calls: Vec<String>,
}

impl InMemoryTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryState> {
        // A poisoned lock only happens after a panicking test thread.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Adds an existing label.
    pub fn insert_label(&self, label: Label) {
        self.lock().labels.insert(label.name.clone(), label);
    }

    /// Adds an existing issue, assigning the next number when it has none.
    pub fn insert_issue(&self, mut issue: Issue) -> u64 {
        let mut state = self.lock();
        if issue.number == 0 {
            issue.number = next_number(&state);
        }
        if issue.state.is_empty() {
            issue.state = "open".to_string();
        }
        let number = issue.number;
        state.issues.push(issue);
        number
    }

    /// Makes `name` look absent while its creation reports "already exists",
    /// as when another process creates it between the two calls.
    pub fn race_label(&self, name: &str) {
        self.lock().racing_labels.insert(name.to_string());
    }

    /// Makes creation of `name` fail with `status`.
    pub fn reject_label(&self, name: &str, status: u16) {
        self.lock().rejected_labels.insert(name.to_string(), status);
    }

    /// Makes every label lookup fail with `status`.
    pub fn fail_label_lookups(&self, status: u16) {
        self.lock().label_lookup_failure = Some(status);
    }

    /// Snapshot of all issues, in creation order.
    #[must_use]
    pub fn issues(&self) -> Vec<Issue> {
        self.lock().issues.clone()
    }

    /// Snapshot of one issue by number.
    #[must_use]
    pub fn issue(&self, number: u64) -> Option<Issue> {
        self.lock().issues.iter().find(|i| i.number == number).cloned()
    }

    /// Whether a label with this name exists.
    #[must_use]
    pub fn has_label(&self, name: &str) -> bool {
        self.lock().labels.contains_key(name)
    }

    /// Calls received so far, as `METHOD target` strings.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of calls whose description starts with `prefix`.
    #[must_use]
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn get_label_now(&self, name: &str) -> Result<Option<Label>, TrackerError> {
        let mut state = self.lock();
        state.calls.push(format!("GET label {name}"));
        if let Some(status) = state.label_lookup_failure {
            return Err(api_error("GET", &format!("labels/{name}"), status, json!({})));
        }
        if state.racing_labels.contains(name) {
            return Ok(None);
        }
        Ok(state.labels.get(name).cloned())
    }

    fn create_label_now(&self, label: Label) -> Result<Label, TrackerError> {
        let mut state = self.lock();
        state.calls.push(format!("POST label {}", label.name));
        if let Some(status) = state.rejected_labels.get(&label.name) {
            return Err(api_error("POST", "labels", *status, json!({"message": "rejected"})));
        }
        if state.racing_labels.contains(&label.name) || state.labels.contains_key(&label.name) {
            return Err(api_error(
                "POST",
                "labels",
                422,
                json!({
                    "message": "Validation Failed",
                    "errors": [{"resource": "Label", "code": "already_exists", "field": "name"}]
                }),
            ));
        }
        state.labels.insert(label.name.clone(), label.clone());
        Ok(label)
    }

    fn list_issues_now(&self, query: IssueQuery) -> Vec<Issue> {
        let mut state = self.lock();
        state.calls.push(format!("GET issues state={} page={}", query.state.as_str(), query.page));
        let per_page = query.per_page.max(1) as usize;
        let skip = (query.page.max(1) as usize - 1) * per_page;
        state
            .issues
            .iter()
            .filter(|issue| match query.state {
                IssueState::All => true,
                IssueState::Open => issue.state == "open",
                IssueState::Closed => issue.state == "closed",
            })
            .skip(skip)
            .take(per_page)
            .cloned()
            .collect()
    }

    fn create_issue_now(&self, new: NewIssue) -> Issue {
        let mut state = self.lock();
        state.calls.push(format!("POST issue {}", new.title));
        let issue = Issue {
            number: next_number(&state),
            title: new.title,
            body: new.body,
            labels: new.labels,
            state: "open".to_string(),
            pull_request: None,
        };
        state.issues.push(issue.clone());
        issue
    }

    fn update_issue_now(&self, number: u64, patch: IssuePatch) -> Result<Issue, TrackerError> {
        let mut state = self.lock();
        state.calls.push(format!("PATCH issue #{number}"));
        let issue = state
            .issues
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or_else(|| {
                api_error("PATCH", &format!("issues/{number}"), 404, json!({"message": "Not Found"}))
            })?;
        issue.labels = patch.labels;
        issue.body = patch.body;
        Ok(issue.clone())
    }
}

fn next_number(state: &InMemoryState) -> u64 {
    state.issues.iter().map(|i| i.number).max().unwrap_or(0) + 1
}

fn api_error(method: &str, target: &str, status: u16, body: serde_json::Value) -> TrackerError {
    TrackerError::Api {
        method: method.to_string(),
        path: format!("/repos/memory/memory/{target}"),
        status,
        body,
    }
}

impl IssueTracker for InMemoryTracker {
    fn get_label(&self, name: &str) -> TrackerFuture<'_, Option<Label>> {
        let result = self.get_label_now(name);
        Box::pin(async move { result })
    }

    fn create_label(&self, label: &Label) -> TrackerFuture<'_, Label> {
        let result = self.create_label_now(label.clone());
        Box::pin(async move { result })
    }

    fn list_issues(&self, query: IssueQuery) -> TrackerFuture<'_, Vec<Issue>> {
        let issues = self.list_issues_now(query);
        Box::pin(async move { Ok(issues) })
    }

    fn create_issue(&self, issue: &NewIssue) -> TrackerFuture<'_, Issue> {
        let created = self.create_issue_now(issue.clone());
        Box::pin(async move { Ok(created) })
    }

    fn update_issue(&self, number: u64, patch: &IssuePatch) -> TrackerFuture<'_, Issue> {
        let result = self.update_issue_now(number, patch.clone());
        Box::pin(async move { result })
    }
}
