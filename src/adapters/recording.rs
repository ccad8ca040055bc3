//! Recording adapter for the `IssueTracker` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::{json, Value};

use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{Issue, IssuePatch, IssueQuery, IssueTracker, Label, NewIssue, TrackerFuture};

/// Records tracker interactions while delegating to an inner implementation.
pub struct RecordingTracker {
    inner: Box<dyn IssueTracker>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingTracker {
    /// Creates a new recording tracker wrapping the given implementation.
    pub fn new(inner: Box<dyn IssueTracker>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

/// Record a `Result<T, E>` interaction using the Ok/Err JSON convention.
///
/// - `Ok(v)` is serialized as `{"Ok": v}`
/// - `Err(e)` is serialized as `{"Err": e.to_string()}`
fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize,
{
    let input_json = serde_json::to_value(input).unwrap_or(Value::Null);
    let output_json = match result {
        Ok(v) => json!({ "Ok": serde_json::to_value(v).unwrap_or(Value::Null) }),
        Err(e) => json!({ "Err": e.to_string() }),
    };

    if let Ok(mut guard) = recorder.lock() {
        guard.record(method, input_json, output_json);
    }
}

#[derive(Serialize)]
struct UpdateIssueInput<'a> {
    number: u64,
    patch: &'a IssuePatch,
}

impl IssueTracker for RecordingTracker {
    fn get_label(&self, name: &str) -> TrackerFuture<'_, Option<Label>> {
        let name = name.to_string();
        Box::pin(async move {
            let result = self.inner.get_label(&name).await;
            record_result(&self.recorder, "get_label", &json!({ "name": name }), &result);
            result
        })
    }

    fn create_label(&self, label: &Label) -> TrackerFuture<'_, Label> {
        let label = label.clone();
        Box::pin(async move {
            let result = self.inner.create_label(&label).await;
            record_result(&self.recorder, "create_label", &label, &result);
            result
        })
    }

    fn list_issues(&self, query: IssueQuery) -> TrackerFuture<'_, Vec<Issue>> {
        Box::pin(async move {
            let result = self.inner.list_issues(query).await;
            record_result(&self.recorder, "list_issues", &query, &result);
            result
        })
    }

    fn create_issue(&self, issue: &NewIssue) -> TrackerFuture<'_, Issue> {
        let issue = issue.clone();
        Box::pin(async move {
            let result = self.inner.create_issue(&issue).await;
            record_result(&self.recorder, "create_issue", &issue, &result);
            result
        })
    }

    fn update_issue(&self, number: u64, patch: &IssuePatch) -> TrackerFuture<'_, Issue> {
        let patch = patch.clone();
        Box::pin(async move {
            let result = self.inner.update_issue(number, &patch).await;
            let input = UpdateIssueInput { number, patch: &patch };
            record_result(&self.recorder, "update_issue", &input, &result);
            result
        })
    }
}
