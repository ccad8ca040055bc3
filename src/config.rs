//! Runtime settings resolved from CLI flags and the environment.

use std::env;
use std::path::Path;

use log::warn;

use crate::error::Error;

/// Default REST API base.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Connection settings for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Repository owner (user or organisation).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Bearer token sent on every request.
    pub token: String,
    /// REST API base URL without a trailing slash.
    pub api_url: String,
}

/// Loads variables from the env file at `path`.
///
/// A missing file is fine; any other failure is logged and returned.
pub fn load_env_file(path: &Path) -> Option<dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => None,
        Err(err) if err.not_found() => None,
        Err(err) => {
            warn!("ignoring {}: {err}", path.display());
            Some(err)
        }
    }
}

impl Settings {
    /// Resolves settings from flags and the process environment.
    ///
    /// Loads `.env` from the working directory first, if present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRepository`] when owner or repo is absent and
    /// [`Error::MissingToken`] when no token variable is set.
    pub fn from_env(owner: Option<&str>, repo: Option<&str>) -> Result<Self, Error> {
        load_env_file(Path::new(".env"));
        Self::resolve(owner, repo, |key| env::var(key).ok())
    }

    /// Resolves settings using `lookup` for environment variables.
    ///
    /// Owner and repo are checked before the token, and empty values count
    /// as missing.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::from_env`].
    pub fn resolve<F>(owner: Option<&str>, repo: Option<&str>, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (Some(owner), Some(repo)) = (non_empty(owner), non_empty(repo)) else {
            return Err(Error::MissingRepository);
        };

        let token = ["GITHUB_TOKEN", "GH_TOKEN"]
            .iter()
            .find_map(|key| lookup(key).filter(|v| !v.is_empty()))
            .ok_or(Error::MissingToken)?;

        let api_url = lookup("GITHUB_API_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self { owner: owner.to_string(), repo: repo.to_string(), token, api_url })
    }

    /// `owner/repo`, as shown in messages and cassettes.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
