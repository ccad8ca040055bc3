//! `tasksync status` command.

use std::path::Path;

use crate::context::ServiceContext;
use crate::error::Error;
use crate::labels::LabelPolicy;
use crate::sync::status::{self, StatusChange, StatusMapping};

/// Execute the `status` command against `ctx`, using the mapping in
/// `updates_path` or the built-in one.
///
/// # Errors
///
/// Returns an error if the updates file is unusable or a tracker call fails.
pub async fn run_with_context(
    ctx: &ServiceContext,
    updates_path: Option<&Path>,
    dry_run: bool,
    policy: LabelPolicy,
) -> Result<(), Error> {
    let mapping = match updates_path {
        Some(path) => StatusMapping::load(path)?,
        None => StatusMapping::builtin(),
    };
    let tracker = ctx.tracker.as_ref();

    if dry_run {
        let changes = status::plan(tracker, &mapping).await?;
        println!("Dry run, would perform:");
        println!("{}", status::format_changes(&changes));
        return Ok(());
    }

    let mut progress = |change: &StatusChange| println!("{}", status::progress_line(change));
    let report = status::update_statuses(tracker, &mapping, policy, &mut progress).await?;
    println!("{}", status::summary_line(report));
    Ok(())
}
