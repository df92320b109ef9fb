//! Root supervisor: one repository watcher per repository of interest.

use tokio_util::sync::CancellationToken;

use crate::api::Repository;

use super::context::WatchContext;
use super::error::SupervisorError;
use super::filter::is_repository_of_interest;
use super::repository::RepositoryWatcher;

/// Fetches the repository list once and starts the watcher tree.
#[derive(Debug)]
pub struct RootSupervisor {
    ctx: WatchContext,
    repositories: Vec<String>,
}

impl RootSupervisor {
    /// `repositories` is the allow-list of repository names; empty watches all.
    #[must_use]
    pub fn new(ctx: WatchContext, repositories: Vec<String>) -> Self {
        Self { ctx, repositories }
    }

    /// Fetch the repository list and spawn a watcher per repository of
    /// interest. Returns the repositories being watched.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be fetched or is empty.
    pub async fn start(&self, cancel: &CancellationToken) -> Result<Vec<Repository>, SupervisorError> {
        let repositories = self.ctx.fetcher().repositories().await?;
        if repositories.is_empty() {
            return Err(SupervisorError::NoRepositories);
        }

        let watched: Vec<Repository> = repositories
            .into_iter()
            .filter(|repository| is_repository_of_interest(repository, &self.repositories))
            .collect();

        if watched.is_empty() {
            tracing::warn!(
                repositories = ?self.repositories,
                "No repository matches the repository filter"
            );
        }

        for repository in &watched {
            let watcher = RepositoryWatcher::new(self.ctx.clone(), repository.clone());
            self.ctx.spawn(watcher.run(cancel.child_token()));
        }

        Ok(watched)
    }

    /// Start the watcher tree and block until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial repository fetch fails or finds no
    /// repository.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), SupervisorError> {
        let watched = self.start(&cancel).await?;
        tracing::debug!(count = watched.len(), "Watcher tree started");

        cancel.cancelled().await;
        tracing::info!("Shutting down watchers");
        Ok(())
    }
}
