//! Port traits defining external boundaries.
//!
//! The issue tracker is the only external system the workflows talk to.
//! Implementations live in `src/adapters/`.

pub mod tracker;

pub use tracker::{
    Issue, IssuePatch, IssueQuery, IssueState, IssueTracker, Label, NewIssue, TrackerFuture,
};
