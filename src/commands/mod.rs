//! Command dispatch and handlers.

pub mod seed;
pub mod status;

use std::env;
use std::path::PathBuf;

use crate::cli::{Command, RepoArgs};
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::error::Error;

/// Environment variable naming a cassette file to record the run into.
pub const RECORD_ENV: &str = "TASKSYNC_RECORD";

/// Dispatch a parsed command to its handler.
///
/// When `TASKSYNC_RECORD` is set to a file path, every tracker interaction
/// is recorded to a cassette at that path, written even if the command fails.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the command fails.
pub async fn dispatch(command: &Command) -> Result<(), Error> {
    let settings = resolve_settings(command)?;
    let ctx = match env::var(RECORD_ENV) {
        Ok(path) if !path.is_empty() => {
            ServiceContext::recording(&settings, &PathBuf::from(path))?
        }
        _ => ServiceContext::live(&settings)?,
    };
    log::debug!("running against {}", settings.slug());
    dispatch_with_context(command, &ctx).await
}

/// Dispatch a command against an already-built context.
///
/// # Errors
///
/// Returns an error if the selected command handler fails.
pub async fn dispatch_with_context(command: &Command, ctx: &ServiceContext) -> Result<(), Error> {
    match command {
        Command::Seed { repo, tasks } => {
            seed::run_with_context(ctx, tasks, repo.dry_run, repo.on_label_error).await
        }
        Command::Status { repo, updates } => {
            status::run_with_context(ctx, updates.as_deref(), repo.dry_run, repo.on_label_error)
                .await
        }
    }
}

fn resolve_settings(command: &Command) -> Result<Settings, Error> {
    let repo: &RepoArgs = match command {
        Command::Seed { repo, .. } | Command::Status { repo, .. } => repo,
    };
    Settings::from_env(repo.owner.as_deref(), repo.repo.as_deref())
}
