//! Watcher error types.

use crate::api::FetchError;

/// Errors that stop the root supervisor before any watcher starts.
#[derive(thiserror::Error, Debug)]
pub enum SupervisorError {
    /// The initial repository list could not be fetched.
    #[error("Failed to fetch repositories: {0}")]
    Fetch(#[from] FetchError),

    /// The project has no repositories at all.
    #[error("No repositories found")]
    NoRepositories,
}
