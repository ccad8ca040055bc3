//! Live adapter for the `IssueTracker` port using the GitHub REST API.

use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Settings;
use crate::error::{Error, TrackerError};
use crate::ports::{Issue, IssuePatch, IssueQuery, IssueTracker, Label, NewIssue, TrackerFuture};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const CLIENT_USER_AGENT: &str = concat!("tasksync/", env!("CARGO_PKG_VERSION"));

/// Issue tracker backed by one GitHub repository.
pub struct GitHubTracker {
    client: Client,
    base: Url,
    token: String,
    owner: String,
    repo: String,
}

impl GitHubTracker {
    /// Creates a tracker for the repository named in `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidApiUrl`] if the API base is not a usable URL.
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let base = Url::parse(&settings.api_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| Error::InvalidApiUrl(settings.api_url.clone()))?;
        Ok(Self {
            client: Client::new(),
            base,
            token: settings.token.clone(),
            owner: settings.owner.clone(),
            repo: settings.repo.clone(),
        })
    }

    /// Builds `<base>/repos/<owner>/<repo>/<segments..>?<query>`.
    ///
    /// Segments are percent-encoded, so label names may contain spaces.
    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["repos", self.owner.as_str(), self.repo.as_str()]);
            path.extend(segments);
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    /// Performs one request and returns the JSON body.
    ///
    /// Bodies that do not parse as JSON read as `{}`; any non-2xx status
    /// becomes [`TrackerError::Api`].
    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Value, TrackerError> {
        let path = display_path(&url);
        debug!("{method} {path}");

        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| TrackerError::Transport {
            method: method.to_string(),
            path: path.clone(),
            source,
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let json = serde_json::from_str(&text).unwrap_or_else(|_| json!({}));

        if !status.is_success() {
            return Err(TrackerError::Api {
                method: method.to_string(),
                path,
                status: status.as_u16(),
                body: json,
            });
        }
        Ok(json)
    }
}

/// Path plus query string, the way it appears in error messages.
fn display_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

/// Decodes a response, falling back to the type's default when the body
/// does not have the expected shape.
fn decode<T: DeserializeOwned + Default>(value: Value, what: &str) -> T {
    serde_json::from_value(value).unwrap_or_else(|e| {
        debug!("unexpected {what} response shape ({e}); using empty value");
        T::default()
    })
}

impl IssueTracker for GitHubTracker {
    fn get_label(&self, name: &str) -> TrackerFuture<'_, Option<Label>> {
        let url = self.endpoint(&["labels", name], &[]);
        Box::pin(async move {
            match self.send::<Value>(Method::GET, url, None).await {
                Ok(value) => Ok(Some(decode(value, "label"))),
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err),
            }
        })
    }

    fn create_label(&self, label: &Label) -> TrackerFuture<'_, Label> {
        let url = self.endpoint(&["labels"], &[]);
        let label = label.clone();
        Box::pin(async move {
            let value = self.send(Method::POST, url, Some(&label)).await?;
            Ok(decode(value, "label"))
        })
    }

    fn list_issues(&self, query: IssueQuery) -> TrackerFuture<'_, Vec<Issue>> {
        let url = self.endpoint(
            &["issues"],
            &[
                ("state", query.state.as_str().to_string()),
                ("per_page", query.per_page.to_string()),
                ("page", query.page.to_string()),
            ],
        );
        Box::pin(async move {
            let value = self.send::<Value>(Method::GET, url, None).await?;
            Ok(decode(value, "issue list"))
        })
    }

    fn create_issue(&self, issue: &NewIssue) -> TrackerFuture<'_, Issue> {
        let url = self.endpoint(&["issues"], &[]);
        let issue = issue.clone();
        Box::pin(async move {
            let value = self.send(Method::POST, url, Some(&issue)).await?;
            Ok(decode(value, "issue"))
        })
    }

    fn update_issue(&self, number: u64, patch: &IssuePatch) -> TrackerFuture<'_, Issue> {
        let url = self.endpoint(&["issues", &number.to_string()], &[]);
        let patch = patch.clone();
        Box::pin(async move {
            let value = self.send(Method::PATCH, url, Some(&patch)).await?;
            Ok(decode(value, "issue"))
        })
    }
}
