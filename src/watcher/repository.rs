//! Repository watcher: discovers pull requests and owns their stop handles.

use std::collections::{HashMap, HashSet};

use tokio_util::sync::CancellationToken;

use crate::api::Repository;

use super::context::WatchContext;
use super::event::Change;
use super::filter::is_pull_request_of_interest;
use super::pull_request::PullRequestWatcher;

/// Polls a repository's pull request list, starts a watcher for every new
/// pull request of interest and stops watchers whose pull request left the
/// list.
#[derive(Debug)]
pub struct RepositoryWatcher {
    ctx: WatchContext,
    repository: Repository,
    watched: HashMap<u64, CancellationToken>,
}

impl RepositoryWatcher {
    #[must_use]
    pub fn new(ctx: WatchContext, repository: Repository) -> Self {
        Self {
            ctx,
            repository,
            watched: HashMap::new(),
        }
    }

    #[must_use]
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Whether a watcher handle is held for `pull_request_id`.
    #[must_use]
    pub fn is_watching(&self, pull_request_id: u64) -> bool {
        self.watched.contains_key(&pull_request_id)
    }

    /// Ids of every pull request with a held watcher handle, sorted.
    #[must_use]
    pub fn watched_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.watched.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Run one poll cycle. New watchers get child tokens of `cancel`.
    pub async fn tick(&mut self, cancel: &CancellationToken) {
        let listed = match self.ctx.fetcher().pull_requests(&self.repository).await {
            Ok(listed) => listed,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    repository = %self.repository.name,
                    "Failed to fetch pull requests"
                );
                return;
            }
        };

        for pull_request in &listed {
            if self.watched.contains_key(&pull_request.id)
                || !is_pull_request_of_interest(pull_request, self.ctx.users())
            {
                continue;
            }

            let token = cancel.child_token();
            self.watched.insert(pull_request.id, token.clone());
            PullRequestWatcher::start(&self.ctx, &self.repository, pull_request, token);
        }

        let present: HashSet<u64> = listed.iter().map(|pr| pr.id).collect();
        let vanished: Vec<u64> = self
            .watched
            .keys()
            .filter(|id| !present.contains(*id))
            .copied()
            .collect();

        for pull_request_id in vanished {
            let Some(token) = self.watched.remove(&pull_request_id) else {
                continue;
            };

            if token.is_cancelled() {
                // Already stopped itself on terminal status.
                tracing::debug!(
                    repository = %self.repository.name,
                    pull_request_id,
                    "Forgetting finished pull request"
                );
                continue;
            }

            token.cancel();
            self.ctx
                .emit(&self.repository, pull_request_id, Change::PullRequestUnwatched);
        }
    }

    /// Poll immediately, then on every interval tick until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            repository = %self.repository.name,
            repository_id = %self.repository.id,
            "Watching repository"
        );

        let mut ticker = self.ctx.ticker();

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let _permit = self.ctx.admit().await;
                    self.tick(&cancel).await;
                }
            }
        }

        tracing::debug!(repository = %self.repository.name, "Repository watcher stopped");
    }
}
