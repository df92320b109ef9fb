//! Snapshot fetcher abstraction consumed by the watchers.

use async_trait::async_trait;

use super::{FetchError, PullRequest, Repository, Thread};

/// Source of entity snapshots.
///
/// Every call returns the entity's full current state. Implementations must be
/// shareable across watcher tasks; the watchers never call the same method for
/// the same entity concurrently.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// List every repository in the project.
    async fn repositories(&self) -> Result<Vec<Repository>, FetchError>;

    /// List the pull requests of a repository.
    async fn pull_requests(&self, repository: &Repository)
        -> Result<Vec<PullRequest>, FetchError>;

    /// Fetch a single pull request with its reviewers and votes.
    async fn pull_request(
        &self,
        repository: &Repository,
        pull_request_id: u64,
    ) -> Result<PullRequest, FetchError>;

    /// List the discussion threads of a pull request.
    async fn threads(
        &self,
        repository: &Repository,
        pull_request_id: u64,
    ) -> Result<Vec<Thread>, FetchError>;
}
