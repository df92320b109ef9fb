//! Review Watch - report Azure DevOps pull request activity as it happens.

pub mod api;
pub mod config;
pub mod display;
pub mod watcher;
