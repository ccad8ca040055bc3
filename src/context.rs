//! Service context bundling the tracker port.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapters::live::github::GitHubTracker;
use crate::adapters::recording::RecordingTracker;
use crate::adapters::replaying::ReplayingTracker;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::Settings;
use crate::error::Error;
use crate::ports::IssueTracker;

/// Bundles the tracker a command runs against.
///
/// Constructors wire up different adapter implementations (live,
/// recording, replaying, or any injected tracker).
pub struct ServiceContext {
    /// Issue tracker for labels and issues.
    pub tracker: Box<dyn IssueTracker>,
    /// Optional cassette recorder; written to disk on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Creates a live context talking to the repository in `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API base URL is unusable.
    pub fn live(settings: &Settings) -> Result<Self, Error> {
        Ok(Self::with_tracker(Box::new(GitHubTracker::new(settings)?)))
    }

    /// Creates a live context that records every tracker interaction to a
    /// cassette at `path`, written when the context is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the API base URL is unusable.
    pub fn recording(settings: &Settings, path: &Path) -> Result<Self, Error> {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S");
        let name = format!("{}-{timestamp}", settings.slug());
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, name, settings.slug())));
        let live = Box::new(GitHubTracker::new(settings)?);
        Ok(Self {
            tracker: Box::new(RecordingTracker::new(live, Arc::clone(&recorder))),
            recorder: Some(recorder),
        })
    }

    /// Creates a context that serves tracker results from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, Error> {
        let replayer = CassetteReplayer::load(path).map_err(Error::Cassette)?;
        Ok(Self::with_tracker(Box::new(ReplayingTracker::new(replayer))))
    }

    /// Creates a context around any tracker implementation.
    #[must_use]
    pub fn with_tracker(tracker: Box<dyn IssueTracker>) -> Self {
        Self { tracker, recorder: None }
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        let Some(recorder) = self.recorder.take() else {
            return;
        };
        let written = match recorder.lock() {
            Ok(recorder) => recorder.finish(),
            Err(e) => Err(std::io::Error::other(e.to_string())),
        };
        match written {
            Ok(path) => eprintln!("Recording saved to: {}", path.display()),
            Err(e) => eprintln!("Warning: failed to write cassette: {e}"),
        }
    }
}
