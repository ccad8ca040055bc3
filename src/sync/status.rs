//! Reconcile the status of existing open issues.
//!
//! Each matched issue loses every `status:` label, gains the target one,
//! has its `- Status:` line rewritten and gets an `Update:` note appended
//! once. Re-running produces the same labels and body.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::labels::{ensure_label, status_label_spec, LabelPolicy, STATUS_PREFIX};
use crate::ports::{Issue, IssuePatch, IssueState, IssueTracker};
use crate::sync::pages::fetch_issues;

/// Target status for one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// Exact title of the issue to update.
    pub title: String,
    /// Issue number; when set, it matches instead of the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    /// Label to attach, e.g. `status:Done`.
    pub status_label: String,
    /// Text for the `- Status:` line, e.g. `In Review`.
    pub status_text: String,
    /// Progress note appended under `Update:`.
    pub note: String,
}

impl StatusUpdate {
    fn new(title: &str, status_label: &str, status_text: &str, note: &str) -> Self {
        Self {
            title: title.to_string(),
            number: None,
            status_label: status_label.to_string(),
            status_text: status_text.to_string(),
            note: note.to_string(),
        }
    }
}

/// Immutable set of status updates passed into the workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMapping {
    entries: Vec<StatusUpdate>,
}

const DONE: (&str, &str) = ("status:Done", "Done");
const IN_REVIEW: (&str, &str) = ("status:In-Review", "In Review");

/// Title, target status and note of the built-in mapping.
const BUILTIN_UPDATES: [(&str, (&str, &str), &str); 19] = [
    ("Rewrite hero value proposition for startup founders", DONE, "Implemented in commit eda4d78"),
    ("Add dual CTA structure (Book Call + Get Sample Roadmap)", DONE, "Implemented in commit eda4d78"),
    ("Create trust strip with logos + metrics", DONE, "Implemented in commit eda4d78"),
    ("Package services into MVP Sprint / Scale Pod / Rescue", DONE, "Implemented in commit 50c0e66"),
    ("Refactor case studies to metric-first format", DONE, "Implemented in commit 50c0e66"),
    (
        "Design and implement homepage section hierarchy v2",
        IN_REVIEW,
        "Implemented across commits eda4d78 + 50c0e66 + 82acf95; pending final QA",
    ),
    ("Improve contact form conversion (short form + SLA)", DONE, "Implemented in commit 82acf95"),
    ("Create 30-day execution board and sprint cadence", DONE, "Implemented in commit 82acf95"),
    ("Create dedicated landing page for MVP development", DONE, "Implemented in commit 554fa6a"),
    (
        "Create dedicated landing page for React/Next.js development",
        DONE,
        "Implemented in commit 554fa6a",
    ),
    ("Create dedicated landing page for DevOps/Cloud delivery", DONE, "Implemented in commit 554fa6a"),
    ("Implement structured data (Organization, Service, FAQ)", DONE, "Implemented in commit 561aed0"),
    (
        "Improve internal linking between homepage, services, projects",
        DONE,
        "Implemented in commit 554fa6a",
    ),
    ("Add testimonial block with founder-focused quotes", DONE, "Implemented in commit 561aed0"),
    ("Optimize mobile hero and CTA visibility", DONE, "Implemented in commit f75e568"),
    (
        "Set up analytics baseline dashboard (CTR, CVR, form completion)",
        DONE,
        "Implemented in commit f75e568 (event baseline + doc)",
    ),
    (
        "Run A/B test for primary CTA copy",
        IN_REVIEW,
        "Variant assignment + tracking implemented in commit f75e568; awaiting live data",
    ),
    (
        "Run A/B test for hero headline variant A vs B",
        IN_REVIEW,
        "Headline variant assignment + event tracking implemented in commit de1a767; awaiting live data",
    ),
    (
        "Standardize design system tokens (spacing, radius, type scale)",
        DONE,
        "Token set + usage docs added in commit de1a767",
    ),
];

/// Labels ensured before every status run.
const REQUIRED_STATUS_LABELS: [&str; 2] = ["status:Done", "status:In-Review"];

impl StatusMapping {
    /// Wraps explicit entries.
    #[must_use]
    pub fn new(entries: Vec<StatusUpdate>) -> Self {
        Self { entries }
    }

    /// The mapping shipped with the tool.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_UPDATES
                .iter()
                .map(|(title, (label, text), note)| StatusUpdate::new(title, label, text, note))
                .collect(),
        )
    }

    /// Reads a JSON array of [`StatusUpdate`] entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadUpdates`] or [`Error::ParseUpdates`].
    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)
            .map_err(|source| Error::ReadUpdates { path: path.to_path_buf(), source })?;
        let entries = serde_json::from_str(&json)
            .map_err(|source| Error::ParseUpdates { path: path.to_path_buf(), source })?;
        Ok(Self::new(entries))
    }

    /// All entries, in order.
    #[must_use]
    pub fn entries(&self) -> &[StatusUpdate] {
        &self.entries
    }

    /// The entry for `issue`: by number when an entry names one, otherwise
    /// by byte-for-byte title.
    #[must_use]
    pub fn lookup(&self, issue: &Issue) -> Option<&StatusUpdate> {
        self.entries.iter().find(|e| e.number == Some(issue.number)).or_else(|| {
            self.entries.iter().find(|e| e.number.is_none() && e.title == issue.title)
        })
    }

    /// Status labels to ensure: the two required ones, then every other
    /// target label in entry order.
    #[must_use]
    pub fn target_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> =
            REQUIRED_STATUS_LABELS.iter().map(ToString::to_string).collect();
        for entry in &self.entries {
            if !labels.contains(&entry.status_label) {
                labels.push(entry.status_label.clone());
            }
        }
        labels
    }
}

/// A planned change to one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Issue number.
    pub number: u64,
    /// Issue title.
    pub title: String,
    /// Status text being applied.
    pub status_text: String,
    /// New labels and body.
    pub patch: IssuePatch,
}

/// Counters reported at the end of a status run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// Issues patched.
    pub touched: usize,
}

fn status_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^- Status:[^\r\n]*").expect("regex"))
}

/// Rewrites every line beginning `- Status:`; appends one when none exists.
#[must_use]
pub fn replace_status_line(body: &str, status_text: &str) -> String {
    let line = format!("- Status: {status_text}");
    if status_line().is_match(body) {
        status_line().replace_all(body, regex::NoExpand(&line)).into_owned()
    } else {
        format!("{body}\n\n{line}").trim().to_string()
    }
}

/// Appends `Update: <note>` unless the note already appears verbatim.
#[must_use]
pub fn append_update_note(body: &str, note: &str) -> String {
    if body.contains(note) {
        return body.to_string();
    }
    format!("{body}\n\nUpdate: {note}").trim().to_string()
}

/// Drops every `status:` label and adds `target`, keeping the rest in order.
#[must_use]
pub fn reconcile_labels(current: &[String], target: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(current.len() + 1);
    for label in current.iter().filter(|l| !l.starts_with(STATUS_PREFIX)) {
        if !labels.contains(label) {
            labels.push(label.clone());
        }
    }
    labels.push(target.to_string());
    labels
}

/// Plans changes for every open, non-PR issue the mapping matches.
#[must_use]
pub fn plan_status(mapping: &StatusMapping, issues: &[Issue]) -> Vec<StatusChange> {
    issues
        .iter()
        .filter(|issue| !issue.is_pull_request())
        .filter_map(|issue| {
            let update = mapping.lookup(issue)?;
            let body = replace_status_line(&issue.body, &update.status_text);
            let body = append_update_note(&body, &update.note);
            Some(StatusChange {
                number: issue.number,
                title: issue.title.clone(),
                status_text: update.status_text.clone(),
                patch: IssuePatch {
                    labels: reconcile_labels(&issue.labels, &update.status_label),
                    body,
                },
            })
        })
        .collect()
}

/// Ensures every status label the mapping can apply.
///
/// # Errors
///
/// Returns the first label error the policy does not absorb.
pub async fn ensure_status_labels(
    tracker: &dyn IssueTracker,
    mapping: &StatusMapping,
    policy: LabelPolicy,
) -> Result<(), Error> {
    for name in mapping.target_labels() {
        ensure_label(tracker, &status_label_spec(&name), policy).await?;
    }
    Ok(())
}

/// Fetches open issues and plans the status changes.
///
/// # Errors
///
/// Returns an error if listing issues fails.
pub async fn plan(
    tracker: &dyn IssueTracker,
    mapping: &StatusMapping,
) -> Result<Vec<StatusChange>, Error> {
    let issues = fetch_issues(tracker, IssueState::Open).await?;
    Ok(plan_status(mapping, &issues))
}

/// Patches each planned issue, calling `progress` after each one.
///
/// # Errors
///
/// Returns the first patch error; earlier patches remain applied.
pub async fn execute_status(
    tracker: &dyn IssueTracker,
    changes: &[StatusChange],
    progress: &mut dyn FnMut(&StatusChange),
) -> Result<StatusReport, Error> {
    let mut report = StatusReport::default();
    for change in changes {
        tracker.update_issue(change.number, &change.patch).await?;
        report.touched += 1;
        progress(change);
    }
    Ok(report)
}

/// Runs the full status workflow: labels, plan, execute.
///
/// # Errors
///
/// Returns the first error; see [`execute_status`].
pub async fn update_statuses(
    tracker: &dyn IssueTracker,
    mapping: &StatusMapping,
    policy: LabelPolicy,
    progress: &mut dyn FnMut(&StatusChange),
) -> Result<StatusReport, Error> {
    ensure_status_labels(tracker, mapping, policy).await?;
    let changes = plan(tracker, mapping).await?;
    execute_status(tracker, &changes, progress).await
}

/// One progress line for an applied change.
#[must_use]
pub fn progress_line(change: &StatusChange) -> String {
    format!("Updated #{}: {} -> {}", change.number, change.title, change.status_text)
}

/// Formats planned changes as a human-readable report.
#[must_use]
pub fn format_changes(changes: &[StatusChange]) -> String {
    if changes.is_empty() {
        return "No matching open issues.".to_string();
    }
    changes
        .iter()
        .map(|c| {
            let labels = c.patch.labels.join(", ");
            format!("  UPDATE #{} {} -> {} [{labels}]", c.number, c.title, c.status_text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The final summary line.
#[must_use]
pub fn summary_line(report: StatusReport) -> String {
    format!("✅ Updated {} issue(s).", report.touched)
}
