//! Paginated issue listing.

use log::debug;

use crate::error::TrackerError;
use crate::ports::{Issue, IssueQuery, IssueState, IssueTracker};

/// Largest page the tracker serves.
pub const PAGE_SIZE: u32 = 100;

/// Fetches every issue in `state`, page by page, until a short page.
///
/// Pull requests are dropped; nothing downstream processes them.
///
/// # Errors
///
/// Returns the first listing error.
pub async fn fetch_issues(
    tracker: &dyn IssueTracker,
    state: IssueState,
) -> Result<Vec<Issue>, TrackerError> {
    let mut issues = Vec::new();
    let mut page = 1;
    loop {
        let batch = tracker.list_issues(IssueQuery { state, page, per_page: PAGE_SIZE }).await?;
        let fetched = batch.len();
        debug!("page {page} of {} issues: {fetched} entries", state.as_str());
        issues.extend(batch.into_iter().filter(|issue| !issue.is_pull_request()));
        if fetched < PAGE_SIZE as usize {
            return Ok(issues);
        }
        page += 1;
    }
}
