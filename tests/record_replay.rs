//! Record-replay round-trip integration test.
//!
//! Records a seed run against the in-memory tracker, then replays the
//! cassette through `ServiceContext::replaying()` and checks that the
//! workflow sees exactly the same tracker responses.

use std::sync::{Arc, Mutex};

use tasksync::adapters::memory::InMemoryTracker;
use tasksync::adapters::recording::RecordingTracker;
use tasksync::cassette::format::Cassette;
use tasksync::cassette::recorder::CassetteRecorder;
use tasksync::context::ServiceContext;
use tasksync::labels::LabelPolicy;
use tasksync::ports::{Issue, IssueTracker};
use tasksync::sync::seed::{seed, SeedAction, SeedReport};
use tasksync::task::TaskRecord;

fn tasks() -> Vec<TaskRecord> {
    let mut dark_mode = TaskRecord::new("Add dark mode");
    dark_mode.area = vec!["UI".into()];
    vec![dark_mode, TaskRecord::new("Existing task")]
}

async fn run_seed(tracker: &dyn IssueTracker) -> (SeedReport, Vec<String>) {
    let mut created = Vec::new();
    let mut progress = |action: &SeedAction| {
        if let SeedAction::Create { title, .. } = action {
            created.push(title.clone());
        }
    };
    let report = seed(tracker, &tasks(), LabelPolicy::FailFast, &mut progress).await.unwrap();
    (report, created)
}

#[tokio::test]
async fn record_then_replay_produces_identical_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let cassette_path = dir.path().join("seed.cassette.yaml");

    // --- Phase 1: record against the in-memory tracker ---
    let memory = InMemoryTracker::new();
    memory.insert_issue(Issue { title: "Existing task".into(), ..Issue::default() });
    let recorder =
        Arc::new(Mutex::new(CassetteRecorder::new(&cassette_path, "seed-run", "acme/site")));
    let recording = RecordingTracker::new(Box::new(memory.clone()), Arc::clone(&recorder));

    let recorded = run_seed(&recording).await;
    assert_eq!(recorded.0, SeedReport { created: 1, skipped: 1 });
    assert_eq!(recorded.1, vec!["Add dark mode"]);

    let written_path = recorder.lock().unwrap().finish().expect("recording should succeed");
    assert_eq!(written_path, cassette_path);

    let cassette =
        Cassette::from_yaml(&std::fs::read_to_string(&cassette_path).unwrap()).unwrap();
    assert_eq!(cassette.repository, "acme/site");
    let methods: Vec<&str> = cassette.interactions.iter().map(|i| i.method.as_str()).collect();
    assert!(methods.contains(&"list_issues"));
    assert_eq!(methods.last(), Some(&"create_issue"));

    // --- Phase 2: replay and compare ---
    let ctx = ServiceContext::replaying(&cassette_path).unwrap();
    let replayed = run_seed(ctx.tracker.as_ref()).await;
    assert_eq!(replayed, recorded);

    // --- Phase 3: replay again for determinism ---
    let ctx = ServiceContext::replaying(&cassette_path).unwrap();
    assert_eq!(run_seed(ctx.tracker.as_ref()).await, recorded);
}

#[tokio::test]
async fn replaying_past_the_end_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let cassette_path = dir.path().join("empty.cassette.yaml");
    CassetteRecorder::new(&cassette_path, "empty", "acme/site").finish().unwrap();

    let ctx = ServiceContext::replaying(&cassette_path).unwrap();
    let err = seed(ctx.tracker.as_ref(), &tasks(), LabelPolicy::FailFast, &mut |_: &SeedAction| {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Cassette exhausted"));
}
