//! Discussion-thread watcher for one pull request.

use tokio_util::sync::CancellationToken;

use crate::api::Repository;

use super::context::WatchContext;
use super::diff::{diff_threads, merge_threads, ThreadSnapshot};

/// Polls the threads of one pull request and reports thread and comment
/// changes. Lives exactly as long as its pull request watcher.
#[derive(Debug)]
pub struct ThreadWatcher {
    ctx: WatchContext,
    repository: Repository,
    pull_request_id: u64,
    threads: ThreadSnapshot,
}

impl ThreadWatcher {
    #[must_use]
    pub fn new(ctx: WatchContext, repository: Repository, pull_request_id: u64) -> Self {
        Self {
            ctx,
            repository,
            pull_request_id,
            threads: ThreadSnapshot::new(),
        }
    }

    /// Threads seen so far, as of the last successful poll.
    #[must_use]
    pub fn snapshot(&self) -> &ThreadSnapshot {
        &self.threads
    }

    /// Run one poll-diff-emit cycle. A failed fetch leaves the snapshot as is.
    pub async fn tick(&mut self) {
        let latest = match self
            .ctx
            .fetcher()
            .threads(&self.repository, self.pull_request_id)
            .await
        {
            Ok(latest) => latest,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    repository = %self.repository.name,
                    pull_request_id = self.pull_request_id,
                    "Failed to fetch pull request threads"
                );
                return;
            }
        };

        for change in diff_threads(&self.threads, &latest) {
            self.ctx.emit(&self.repository, self.pull_request_id, change);
        }
        merge_threads(&mut self.threads, latest);
    }

    /// Poll immediately, then on every interval tick until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = self.ctx.ticker();

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let _permit = self.ctx.admit().await;
                    self.tick().await;
                }
            }
        }

        tracing::debug!(
            repository = %self.repository.name,
            pull_request_id = self.pull_request_id,
            "Thread watcher stopped"
        );
    }
}
