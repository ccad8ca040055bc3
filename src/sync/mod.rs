//! Workflows that reconcile local tasks with the tracker.

pub mod pages;
pub mod seed;
pub mod status;
