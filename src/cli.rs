//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::labels::LabelPolicy;
use crate::task::DEFAULT_TASKS_PATH;

/// Top-level CLI parser for `tasksync`.
#[derive(Debug, Parser)]
#[command(name = "tasksync", version, about = "Seed and reconcile project tasks as GitHub issues")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct RepoArgs {
    /// Repository owner (user or organisation).
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name.
    #[arg(long)]
    pub repo: Option<String>,

    /// What to do when a label cannot be created.
    #[arg(long, value_enum, default_value_t = LabelPolicy::FailFast)]
    pub on_label_error: LabelPolicy,

    /// Print the planned changes without touching the tracker's issues or labels.
    #[arg(long)]
    pub dry_run: bool,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create one issue per task, skipping titles that already exist.
    Seed {
        /// Repository and run options.
        #[command(flatten)]
        repo: RepoArgs,

        /// Path to the JSON task file.
        #[arg(long, default_value = DEFAULT_TASKS_PATH)]
        tasks: PathBuf,
    },
    /// Move matching open issues to their target status.
    Status {
        /// Repository and run options.
        #[command(flatten)]
        repo: RepoArgs,

        /// JSON file of status updates; the built-in mapping when omitted.
        #[arg(long)]
        updates: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use crate::labels::LabelPolicy;
    use clap::Parser;

    #[test]
    fn parses_seed_with_default_task_file() {
        let cli = Cli::parse_from(["tasksync", "seed", "--owner", "acme", "--repo", "site"]);
        let Command::Seed { repo, tasks } = cli.command else {
            panic!("expected seed");
        };
        assert_eq!(repo.owner.as_deref(), Some("acme"));
        assert_eq!(repo.repo.as_deref(), Some("site"));
        assert_eq!(repo.on_label_error, LabelPolicy::FailFast);
        assert!(!repo.dry_run);
        assert_eq!(tasks.to_str(), Some("./gradeup_tasks.json"));
    }

    #[test]
    fn parses_status_options() {
        let cli = Cli::parse_from([
            "tasksync",
            "status",
            "--owner",
            "acme",
            "--repo",
            "site",
            "--updates",
            "updates.json",
            "--on-label-error",
            "continue",
            "--dry-run",
        ]);
        let Command::Status { repo, updates } = cli.command else {
            panic!("expected status");
        };
        assert_eq!(repo.on_label_error, LabelPolicy::Continue);
        assert!(repo.dry_run);
        assert_eq!(updates.unwrap().to_str(), Some("updates.json"));
    }

    #[test]
    fn owner_and_repo_are_optional_at_parse_time() {
        let cli = Cli::parse_from(["tasksync", "status"]);
        assert!(matches!(cli.command, Command::Status { ref repo, .. } if repo.owner.is_none()));
    }
}
