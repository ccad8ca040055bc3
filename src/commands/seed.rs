//! `tasksync seed` command.

use std::path::Path;

use crate::context::ServiceContext;
use crate::error::Error;
use crate::labels::LabelPolicy;
use crate::sync::seed::{self, SeedAction};
use crate::task::load_tasks;

/// Execute the `seed` command against `ctx`.
///
/// # Errors
///
/// Returns an error if the task file is unreadable or a tracker call fails.
pub async fn run_with_context(
    ctx: &ServiceContext,
    tasks_path: &Path,
    dry_run: bool,
    policy: LabelPolicy,
) -> Result<(), Error> {
    let tasks = load_tasks(tasks_path)?;
    let tracker = ctx.tracker.as_ref();

    if dry_run {
        let actions = seed::plan(tracker, &tasks).await?;
        println!("Dry run, would perform:");
        println!("{}", seed::format_actions(&actions));
        return Ok(());
    }

    let mut progress = |action: &SeedAction| {
        if let Some(line) = seed::progress_line(action) {
            println!("{line}");
        }
    };
    let report = seed::seed(tracker, &tasks, policy, &mut progress).await?;
    println!("{}", seed::summary_line(report));
    Ok(())
}
