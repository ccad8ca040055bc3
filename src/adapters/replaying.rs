//! Replaying adapter for the `IssueTracker` port.

use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cassette::replayer::CassetteReplayer;
use crate::error::TrackerError;
use crate::ports::{Issue, IssuePatch, IssueQuery, IssueTracker, Label, NewIssue, TrackerFuture};

/// Serves recorded tracker results from a cassette.
///
/// Inputs are ignored; each method returns its recorded outputs in order.
pub struct ReplayingTracker {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingTracker {
    /// Create a replaying tracker backed by the given replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn next_output(&self, method: &str) -> Result<Value, TrackerError> {
        let mut replayer = self
            .replayer
            .lock()
            .map_err(|e| TrackerError::Replayed(format!("replayer lock poisoned: {e}")))?;
        replayer
            .next_interaction(method)
            .map(|interaction| interaction.output.clone())
            .map_err(TrackerError::Replayed)
    }

    fn replay<T: DeserializeOwned>(&self, method: &str) -> Result<T, TrackerError> {
        replay_result(method, self.next_output(method)?)
    }
}

/// Decodes a recorded `{"Ok": v}` / `{"Err": msg}` output.
fn replay_result<T: DeserializeOwned>(method: &str, output: Value) -> Result<T, TrackerError> {
    if let Some(err) = output.get("Err") {
        let msg = err.as_str().unwrap_or("unknown error").to_string();
        return Err(TrackerError::Replayed(msg));
    }
    let value = output.get("Ok").cloned().unwrap_or(output);
    serde_json::from_value(value).map_err(|e| {
        TrackerError::Replayed(format!("{method}: failed to deserialize recorded output: {e}"))
    })
}

impl IssueTracker for ReplayingTracker {
    fn get_label(&self, _name: &str) -> TrackerFuture<'_, Option<Label>> {
        let result = self.replay("get_label");
        Box::pin(async move { result })
    }

    fn create_label(&self, _label: &Label) -> TrackerFuture<'_, Label> {
        let result = self.replay("create_label");
        Box::pin(async move { result })
    }

    fn list_issues(&self, _query: IssueQuery) -> TrackerFuture<'_, Vec<Issue>> {
        let result = self.replay("list_issues");
        Box::pin(async move { result })
    }

    fn create_issue(&self, _issue: &NewIssue) -> TrackerFuture<'_, Issue> {
        let result = self.replay("create_issue");
        Box::pin(async move { result })
    }

    fn update_issue(&self, _number: u64, _patch: &IssuePatch) -> TrackerFuture<'_, Issue> {
        let result = self.replay("update_issue");
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    fn tracker(interactions: Vec<(&str, Value)>) -> ReplayingTracker {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            repository: "acme/site".into(),
            interactions: interactions
                .into_iter()
                .enumerate()
                .map(|(seq, (method, output))| Interaction {
                    seq: seq as u64,
                    method: method.into(),
                    input: json!({}),
                    output,
                })
                .collect(),
        };
        ReplayingTracker::new(CassetteReplayer::new(&cassette))
    }

    #[tokio::test]
    async fn replays_ok_and_err_outputs() {
        let tracker = tracker(vec![
            ("get_label", json!({"Ok": null})),
            (
                "create_label",
                json!({
                    "Err": "GitHub API POST /repos/acme/site/labels failed: 422 \
                            {\"message\":\"Validation Failed\"}"
                }),
            ),
        ]);
        assert_eq!(tracker.get_label("status:Done").await.unwrap(), None);
        let err = tracker.create_label(&Label::default()).await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn exhausted_cassette_is_an_error_not_a_panic() {
        let tracker = tracker(vec![]);
        let err = tracker.list_issues(IssueQuery {
            state: crate::ports::IssueState::All,
            page: 1,
            per_page: 100,
        });
        assert!(err.await.unwrap_err().to_string().contains("Cassette exhausted"));
    }
}
