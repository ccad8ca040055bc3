//! Label naming and the create-if-missing label ensurer.
//!
//! Labels encode three facets of an issue: `status:<Name>`,
//! `priority:<P0|P1|P2>` and `area:<slug>`.

use std::sync::OnceLock;

use clap::ValueEnum;
use log::{debug, info, warn};
use regex::Regex;

use crate::error::TrackerError;
use crate::ports::{IssueTracker, Label};
use crate::task::Priority;

/// Prefix shared by every status label.
pub const STATUS_PREFIX: &str = "status:";

/// Prefix shared by every area label.
pub const AREA_PREFIX: &str = "area:";

/// Color for `area:` labels.
pub const AREA_COLOR: &str = "1D76DB";

/// Description for `area:` labels.
pub const AREA_DESCRIPTION: &str = "Task area";

/// Color for status labels outside the baseline set.
pub const FALLBACK_STATUS_COLOR: &str = "BFDADC";

/// Status and priority labels every seeded repository carries:
/// `(name, color, description)`.
pub const BASELINE_LABELS: [(&str, &str, &str); 7] = [
    ("status:Backlog", "BFDADC", "Default status"),
    ("status:In-Progress", "FBCA04", "Work started"),
    ("status:In-Review", "5319E7", "Awaiting review"),
    ("status:Done", "0E8A16", "Completed"),
    ("priority:P0", "B60205", "Critical priority"),
    ("priority:P1", "D93F0B", "High priority"),
    ("priority:P2", "FBCA04", "Medium priority"),
];

/// The baseline labels as [`Label`] values.
#[must_use]
pub fn baseline_labels() -> Vec<Label> {
    BASELINE_LABELS.iter().map(|(name, color, desc)| Label::new(*name, *color, *desc)).collect()
}

/// A status label with the baseline color and description when it has
/// one, a neutral color otherwise.
#[must_use]
pub fn status_label_spec(name: &str) -> Label {
    BASELINE_LABELS
        .iter()
        .find(|(baseline, _, _)| *baseline == name)
        .map_or_else(
            || Label::new(name, FALLBACK_STATUS_COLOR, "Status"),
            |(name, color, desc)| Label::new(*name, *color, *desc),
        )
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("regex"))
}

fn disallowed_label_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9:_-]").expect("regex"))
}

/// Turns free text into a label suffix: trim, collapse whitespace runs to
/// `-`, drop every character outside `[A-Za-z0-9:_-]`.
#[must_use]
pub fn sanitize_label_part(value: &str) -> String {
    let hyphenated = whitespace_runs().replace_all(value.trim(), "-");
    disallowed_label_chars().replace_all(&hyphenated, "").into_owned()
}

/// `status:<status>` with whitespace runs replaced by `-`.
#[must_use]
pub fn status_label(status: &str) -> String {
    format!("{STATUS_PREFIX}{}", whitespace_runs().replace_all(status, "-"))
}

/// `priority:<P>`.
#[must_use]
pub fn priority_label(priority: Priority) -> String {
    format!("priority:{priority}")
}

/// `area:<sanitized>`, or `None` when nothing survives sanitization.
#[must_use]
pub fn area_label(area: &str) -> Option<String> {
    let part = sanitize_label_part(area);
    (!part.is_empty()).then(|| format!("{AREA_PREFIX}{part}"))
}

/// What to do when a label cannot be created for a reason other than
/// already existing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LabelPolicy {
    /// Abort the run.
    #[default]
    FailFast,
    /// Log a warning and carry on without the label.
    Continue,
}

/// Result of [`ensure_label`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelOutcome {
    /// The label was already there (or appeared concurrently).
    Existing,
    /// The label was created by this call.
    Created,
    /// Creation failed and the policy said to continue.
    Skipped,
}

/// Makes sure `label` exists, creating it when the tracker reports it missing.
///
/// A create that fails because the label now exists counts as success.
///
/// # Errors
///
/// Returns the lookup error for any failure other than "not found", and the
/// creation error when `policy` is [`LabelPolicy::FailFast`].
pub async fn ensure_label(
    tracker: &dyn IssueTracker,
    label: &Label,
    policy: LabelPolicy,
) -> Result<LabelOutcome, TrackerError> {
    if tracker.get_label(&label.name).await?.is_some() {
        debug!("label {} exists", label.name);
        return Ok(LabelOutcome::Existing);
    }

    match tracker.create_label(label).await {
        Ok(_) => {
            info!("created label {}", label.name);
            Ok(LabelOutcome::Created)
        }
        Err(err) if err.is_already_exists() => {
            debug!("label {} was created concurrently", label.name);
            Ok(LabelOutcome::Existing)
        }
        Err(err) => match policy {
            LabelPolicy::FailFast => Err(err),
            LabelPolicy::Continue => {
                warn!("could not create label {}: {err}", label.name);
                Ok(LabelOutcome::Skipped)
            }
        },
    }
}
