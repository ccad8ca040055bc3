//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::Command;

fn run_tasksync(dir: &Path, args: &[&str], token: Option<&str>) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_tasksync");
    let mut command = Command::new(bin);
    command
        .args(args)
        .current_dir(dir)
        .env_remove("GITHUB_TOKEN")
        .env_remove("GH_TOKEN")
        .env_remove("TASKSYNC_RECORD")
        .env("GITHUB_API_URL", "http://127.0.0.1:9");
    if let Some(token) = token {
        command.env("GITHUB_TOKEN", token);
    }
    command.output().expect("failed to run tasksync binary")
}

#[test]
fn missing_owner_and_repo_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_tasksync(dir.path(), &["seed"], Some("token"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("❌ --owner and --repo are required"));
}

#[test]
fn missing_repo_is_checked_before_token() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_tasksync(dir.path(), &["status", "--owner", "acme"], None);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("--owner and --repo are required"));
}

#[test]
fn missing_token_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_tasksync(dir.path(), &["seed", "--owner", "acme", "--repo", "site"], None);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("❌ Set GITHUB_TOKEN or GH_TOKEN"));
}

#[test]
fn token_is_read_from_dotenv_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "GH_TOKEN=from-dotenv\n").unwrap();
    let output = run_tasksync(
        dir.path(),
        &["seed", "--owner", "acme", "--repo", "site", "--tasks", "missing.json"],
        None,
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(!stderr.contains("GITHUB_TOKEN"));
    assert!(stderr.contains("Failed to read task file missing.json"));
}

#[test]
fn unreadable_task_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_tasksync(dir.path(), &["seed", "--owner", "acme", "--repo", "site"], Some("t"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("❌ Failed to read task file ./gradeup_tasks.json"));
}

#[test]
fn malformed_task_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tasks.json"), "{not json").unwrap();
    let output = run_tasksync(
        dir.path(),
        &["seed", "--owner", "acme", "--repo", "site", "--tasks", "tasks.json"],
        Some("t"),
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("Failed to parse task file tasks.json"));
}

#[test]
fn unreachable_tracker_reports_transport_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_tasksync(
        dir.path(),
        &["status", "--owner", "acme", "--repo", "site", "--dry-run"],
        Some("t"),
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.starts_with("❌ "));
    assert!(stderr.contains("/repos/acme/site/issues"));
}

#[test]
fn help_shows_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_tasksync(dir.path(), &["--help"], None);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("seed"));
    assert!(stdout.contains("status"));
}

#[test]
fn seed_help_shows_options() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_tasksync(dir.path(), &["seed", "--help"], None);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("--tasks"));
    assert!(stdout.contains("--on-label-error"));
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_tasksync(dir.path(), &["nonsense"], None);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("unrecognized subcommand"));
}
