//! Seed task records as issues.
//!
//! Idempotent: a task whose title already names an issue (open or closed)
//! is skipped, so re-running after a crash never creates duplicates.

use std::collections::HashSet;
use std::fmt::Write;

use crate::error::Error;
use crate::labels::{
    area_label, baseline_labels, ensure_label, priority_label, status_label, LabelPolicy,
    AREA_COLOR, AREA_DESCRIPTION, AREA_PREFIX,
};
use crate::ports::{Issue, IssueState, IssueTracker, Label, NewIssue};
use crate::sync::pages::fetch_issues;
use crate::task::TaskRecord;

/// What the seeder will do (or did) for a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedAction {
    /// A new issue will be / was created.
    Create {
        /// Title of the new issue.
        title: String,
        /// Labels attached on creation.
        labels: Vec<String>,
    },
    /// An issue with this title already exists.
    Skip {
        /// The task title.
        title: String,
    },
}

/// Counters reported at the end of a seed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Issues created.
    pub created: usize,
    /// Tasks skipped because their title already exists.
    pub skipped: usize,
}

/// Builds the issue body for a task.
#[must_use]
pub fn issue_body(task: &TaskRecord) -> String {
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    let estimate = task.estimate.map_or_else(|| "-".to_string(), |e| e.to_string());

    let mut body = String::new();
    let _ = writeln!(body, "## Objective\n{}\n", task.title);
    let _ = writeln!(body, "## Acceptance Criteria\n{}\n", or_dash(&task.acceptance));
    let _ = writeln!(body, "## Notes\n{}\n", or_dash(&task.notes));
    body.push_str("## Metadata\n");
    let _ = writeln!(body, "- Priority: {}", task.priority);
    let _ = writeln!(body, "- Status: {}", task.status());
    let _ = writeln!(body, "- Estimate: {estimate} pts");
    let _ = write!(body, "- Area: {}", or_dash(&task.area.join(", ")));
    body
}

/// Computes the label set for a task: priority, status, then one label per
/// area, in that order and without duplicates.
#[must_use]
pub fn issue_labels(task: &TaskRecord) -> Vec<String> {
    let mut labels = vec![priority_label(task.priority), status_label(task.status())];
    for label in task.area.iter().filter_map(|area| area_label(area)) {
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}

/// Plans seed actions for `tasks` against the existing issues.
///
/// Titles compare exactly. A title repeated in `tasks` is created once.
#[must_use]
pub fn plan_seed(tasks: &[TaskRecord], existing: &[Issue]) -> Vec<SeedAction> {
    let mut titles: HashSet<&str> = existing
        .iter()
        .filter(|issue| !issue.is_pull_request())
        .map(|issue| issue.title.as_str())
        .collect();

    tasks
        .iter()
        .map(|task| {
            if titles.insert(task.title.as_str()) {
                SeedAction::Create { title: task.title.clone(), labels: issue_labels(task) }
            } else {
                SeedAction::Skip { title: task.title.clone() }
            }
        })
        .collect()
}

/// Ensures every baseline status and priority label exists.
///
/// # Errors
///
/// Returns the first label error the policy does not absorb.
pub async fn ensure_baseline_labels(
    tracker: &dyn IssueTracker,
    policy: LabelPolicy,
) -> Result<(), Error> {
    for label in baseline_labels() {
        ensure_label(tracker, &label, policy).await?;
    }
    Ok(())
}

/// Fetches all issues (open and closed) and plans the seed.
///
/// # Errors
///
/// Returns an error if listing issues fails.
pub async fn plan(
    tracker: &dyn IssueTracker,
    tasks: &[TaskRecord],
) -> Result<Vec<SeedAction>, Error> {
    let existing = fetch_issues(tracker, IssueState::All).await?;
    Ok(plan_seed(tasks, &existing))
}

/// Executes planned seed actions, calling `progress` after each one.
///
/// Actions reference tasks by title; every `Create` title must appear in
/// `tasks` (guaranteed when actions come from [`plan_seed`]).
///
/// # Errors
///
/// Returns [`Error::UnknownTask`] for a `Create` whose title is not in
/// `tasks`, and otherwise the first label or issue-creation error; issues
/// created before it remain.
pub async fn execute_seed(
    tracker: &dyn IssueTracker,
    tasks: &[TaskRecord],
    actions: &[SeedAction],
    policy: LabelPolicy,
    progress: &mut dyn FnMut(&SeedAction),
) -> Result<SeedReport, Error> {
    let mut report = SeedReport::default();
    for action in actions {
        match action {
            SeedAction::Skip { .. } => report.skipped += 1,
            SeedAction::Create { title, labels } => {
                let task = tasks
                    .iter()
                    .find(|t| t.title == *title)
                    .ok_or_else(|| Error::UnknownTask(title.clone()))?;
                for name in labels.iter().filter(|l| l.starts_with(AREA_PREFIX)) {
                    let label = Label::new(name.as_str(), AREA_COLOR, AREA_DESCRIPTION);
                    ensure_label(tracker, &label, policy).await?;
                }
                let issue = NewIssue {
                    title: title.clone(),
                    body: issue_body(task),
                    labels: labels.clone(),
                };
                tracker.create_issue(&issue).await?;
                report.created += 1;
            }
        }
        progress(action);
    }
    Ok(report)
}

/// Runs the full seed workflow: baseline labels, plan, execute.
///
/// # Errors
///
/// Returns the first error; see [`execute_seed`].
pub async fn seed(
    tracker: &dyn IssueTracker,
    tasks: &[TaskRecord],
    policy: LabelPolicy,
    progress: &mut dyn FnMut(&SeedAction),
) -> Result<SeedReport, Error> {
    ensure_baseline_labels(tracker, policy).await?;
    let actions = plan(tracker, tasks).await?;
    execute_seed(tracker, tasks, &actions, policy, progress).await
}

/// One progress line for an executed action, `None` for silent skips.
#[must_use]
pub fn progress_line(action: &SeedAction) -> Option<String> {
    match action {
        SeedAction::Create { title, .. } => Some(format!("Created issue: {title}")),
        SeedAction::Skip { .. } => None,
    }
}

/// Formats planned actions as a human-readable report.
#[must_use]
pub fn format_actions(actions: &[SeedAction]) -> String {
    if actions.is_empty() {
        return "No tasks to seed.".to_string();
    }

    let mut lines = Vec::new();
    for action in actions {
        match action {
            SeedAction::Create { title, labels } => {
                lines.push(format!("  CREATE {title} [{}]", labels.join(", ")));
            }
            SeedAction::Skip { title } => lines.push(format!("  SKIP {title}")),
        }
    }
    lines.join("\n")
}

/// The final summary line.
#[must_use]
pub fn summary_line(report: SeedReport) -> String {
    format!("✅ Done. Created {}, skipped {}.", report.created, report.skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryTracker;
    use crate::task::Priority;

    fn dark_mode() -> TaskRecord {
        TaskRecord {
            priority: Priority::P2,
            area: vec!["UI".into(), "Settings".into()],
            ..TaskRecord::new("Add dark mode")
        }
    }

    fn existing(title: &str) -> Issue {
        Issue { number: 1, title: title.into(), state: "closed".into(), ..Issue::default() }
    }

    #[test]
    fn body_follows_template_with_dashes() {
        let body = issue_body(&TaskRecord::new("Add dark mode"));
        assert_eq!(
            body,
            "## Objective\nAdd dark mode\n\n\
             ## Acceptance Criteria\n-\n\n\
             ## Notes\n-\n\n\
             ## Metadata\n\
             - Priority: P1\n\
             - Status: Backlog\n\
             - Estimate: - pts\n\
             - Area: -"
        );
    }

    #[test]
    fn body_includes_task_fields() {
        let task = TaskRecord {
            estimate: Some(3.0),
            acceptance: "Toggle persists".into(),
            notes: "Use CSS variables".into(),
            status: Some("In Progress".into()),
            ..dark_mode()
        };
        let body = issue_body(&task);
        assert!(body.contains("## Acceptance Criteria\nToggle persists\n"));
        assert!(body.contains("## Notes\nUse CSS variables\n"));
        assert!(body.contains("- Status: In Progress\n"));
        assert!(body.contains("- Estimate: 3 pts\n"));
        assert!(body.ends_with("- Area: UI, Settings"));
    }

    #[test]
    fn fractional_estimate_is_kept() {
        let task = TaskRecord { estimate: Some(2.5), ..TaskRecord::new("x") };
        assert!(issue_body(&task).contains("- Estimate: 2.5 pts"));
    }

    #[test]
    fn labels_cover_priority_status_and_areas() {
        assert_eq!(
            issue_labels(&dark_mode()),
            vec!["priority:P2", "status:Backlog", "area:UI", "area:Settings"]
        );
    }

    #[test]
    fn duplicate_areas_collapse() {
        let task = TaskRecord {
            area: vec!["Mobile Apps".into(), "  Mobile   Apps!! ".into()],
            ..TaskRecord::new("x")
        };
        assert_eq!(issue_labels(&task), vec!["priority:P1", "status:Backlog", "area:Mobile-Apps"]);
    }

    #[test]
    fn plan_skips_existing_titles_exactly() {
        let tasks =
            vec![dark_mode(), TaskRecord::new("add dark mode"), TaskRecord::new("Add dark mode ")];
        let actions = plan_seed(&tasks, &[existing("Add dark mode")]);
        assert!(matches!(&actions[0], SeedAction::Skip { title } if title == "Add dark mode"));
        assert!(matches!(&actions[1], SeedAction::Create { .. }));
        assert!(matches!(&actions[2], SeedAction::Create { .. }));
    }

    #[test]
    fn plan_ignores_pull_request_titles() {
        let pr = Issue {
            pull_request: Some(serde_json::json!({})),
            ..existing("Add dark mode")
        };
        let actions = plan_seed(&[dark_mode()], &[pr]);
        assert!(matches!(&actions[0], SeedAction::Create { .. }));
    }

    #[test]
    fn plan_creates_repeated_title_once() {
        let actions = plan_seed(&[dark_mode(), dark_mode()], &[]);
        assert!(matches!(&actions[0], SeedAction::Create { .. }));
        assert!(matches!(&actions[1], SeedAction::Skip { .. }));
    }

    #[tokio::test]
    async fn seed_creates_issue_with_labels() {
        let tracker = InMemoryTracker::new();
        let mut lines = Vec::new();
        let report = seed(&tracker, &[dark_mode()], LabelPolicy::FailFast, &mut |a: &SeedAction| {
            lines.extend(progress_line(a));
        })
        .await
        .unwrap();

        assert_eq!(report, SeedReport { created: 1, skipped: 0 });
        assert_eq!(lines, vec!["Created issue: Add dark mode"]);
        let issues = tracker.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].labels,
            vec!["priority:P2", "status:Backlog", "area:UI", "area:Settings"]
        );
        assert!(issues[0].body.contains("## Objective\nAdd dark mode"));
        assert!(tracker.has_label("area:UI"));
        assert!(tracker.has_label("priority:P0"));
    }

    #[tokio::test]
    async fn skipped_tasks_make_no_calls() {
        let tracker = InMemoryTracker::new();
        tracker.insert_issue(existing("Add dark mode"));
        let report = seed(&tracker, &[dark_mode()], LabelPolicy::FailFast, &mut |_: &SeedAction| {})
            .await
            .unwrap();
        assert_eq!(report, SeedReport { created: 0, skipped: 1 });
        assert_eq!(tracker.count_calls("POST issue"), 0);
        assert!(!tracker.has_label("area:UI"));
    }

    #[tokio::test]
    async fn rejected_area_label_aborts_under_fail_fast() {
        let tracker = InMemoryTracker::new();
        tracker.reject_label("area:UI", 403);
        let tasks = vec![TaskRecord::new("First"), dark_mode()];
        let result = seed(&tracker, &tasks, LabelPolicy::FailFast, &mut |_: &SeedAction| {}).await;
        assert!(result.is_err());
        let titles: Vec<_> = tracker.issues().into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["First"]);
    }

    #[tokio::test]
    async fn rejected_area_label_is_skipped_under_continue() {
        let tracker = InMemoryTracker::new();
        tracker.reject_label("area:UI", 403);
        let report = seed(&tracker, &[dark_mode()], LabelPolicy::Continue, &mut |_: &SeedAction| {})
            .await
            .unwrap();
        assert_eq!(report.created, 1);
    }

    #[test]
    fn format_and_summary() {
        let actions = vec![
            SeedAction::Create { title: "A".into(), labels: vec!["priority:P1".into()] },
            SeedAction::Skip { title: "B".into() },
        ];
        let output = format_actions(&actions);
        assert!(output.contains("CREATE A [priority:P1]"));
        assert!(output.contains("SKIP B"));
        assert_eq!(format_actions(&[]), "No tasks to seed.");
        assert_eq!(
            summary_line(SeedReport { created: 2, skipped: 3 }),
            "✅ Done. Created 2, skipped 3."
        );
    }

    #[tokio::test]
    async fn create_for_unknown_task_is_an_error() {
        let tracker = InMemoryTracker::new();
        let actions = vec![SeedAction::Create { title: "Ghost".into(), labels: vec![] }];
        let mut seen = 0;
        let result = execute_seed(
            &tracker,
            &[TaskRecord::new("Add dark mode")],
            &actions,
            LabelPolicy::FailFast,
            &mut |_: &SeedAction| seen += 1,
        )
        .await;
        assert!(matches!(result, Err(Error::UnknownTask(ref title)) if title == "Ghost"));
        assert_eq!(seen, 0);
        assert_eq!(tracker.count_calls("POST"), 0);
    }
}
