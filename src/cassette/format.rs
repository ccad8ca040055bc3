//! Cassette data structures for recording and replaying interactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded call against the issue tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number (assigned automatically by the recorder).
    pub seq: u64,
    /// Tracker method invoked (e.g. "`create_issue`").
    pub method: String,
    /// Arguments sent to the tracker.
    pub input: serde_json::Value,
    /// Result returned, as `{"Ok": value}` or `{"Err": message}`.
    pub output: serde_json::Value,
}

/// A cassette containing a sequence of recorded interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// `owner/repo` the interactions ran against.
    pub repository: String,
    /// Ordered list of interactions.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Parses a cassette from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error string if the YAML does not describe a cassette.
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        serde_yaml::from_str(yaml).map_err(|e| format!("Failed to parse cassette: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_hand_written_cassette() {
        let yaml = r#"
name: seed-run
recorded_at: 2026-03-01T12:00:00Z
repository: acme/site
interactions:
  - seq: 0
    method: get_label
    input: { name: "status:Done" }
    output: { Ok: null }
  - seq: 1
    method: create_label
    input: { name: "status:Done", color: 0E8A16, description: Completed }
    output: { Err: "GitHub API POST /repos/acme/site/labels failed: 422 {}" }
"#;
        let cassette = Cassette::from_yaml(yaml).unwrap();
        assert_eq!(cassette.repository, "acme/site");
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].output, json!({"Ok": null}));
        assert_eq!(cassette.interactions[1].input["color"], json!("0E8A16"));
    }

    #[test]
    fn rejects_non_cassette_yaml() {
        assert!(Cassette::from_yaml("- just\n- a list\n").is_err());
    }
}
