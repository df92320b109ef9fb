//! Pull-request watcher: detail polling, vote tracking and terminal detection.

use tokio_util::sync::CancellationToken;

use crate::api::{PullRequest, Repository};

use super::context::WatchContext;
use super::diff::diff_pull_request;
use super::event::Change;
use super::thread::ThreadWatcher;

/// Lifecycle of a pull request watcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatchState {
    /// No successful fetch yet.
    #[default]
    Unstarted,
    /// At least one snapshot held; polling continues.
    Tracking,
    /// Terminal status observed; no further polling.
    Stopped,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Terminal,
}

/// Polls one pull request's detail and reports status, commit and vote
/// changes until the pull request is abandoned or completed.
#[derive(Debug)]
pub struct PullRequestWatcher {
    ctx: WatchContext,
    repository: Repository,
    pull_request_id: u64,
    previous: Option<PullRequest>,
    state: WatchState,
}

impl PullRequestWatcher {
    #[must_use]
    pub fn new(ctx: WatchContext, repository: Repository, pull_request_id: u64) -> Self {
        Self {
            ctx,
            repository,
            pull_request_id,
            previous: None,
            state: WatchState::Unstarted,
        }
    }

    /// Announce `listed` and spawn its pull request and thread watchers.
    ///
    /// Both watchers stop when `cancel` fires; the pull request watcher fires
    /// it itself on terminal status.
    pub fn start(
        ctx: &WatchContext,
        repository: &Repository,
        listed: &PullRequest,
        cancel: CancellationToken,
    ) {
        ctx.emit(
            repository,
            listed.id,
            Change::PullRequestWatched {
                author: listed.author.display_name.clone(),
                title: listed.title.clone(),
                description: listed.description.clone(),
                status: listed.status,
                source_ref: listed.source_ref.clone(),
                target_ref: listed.target_ref.clone(),
            },
        );

        let threads = ThreadWatcher::new(ctx.clone(), repository.clone(), listed.id);
        ctx.spawn(threads.run(cancel.clone()));

        let watcher = Self::new(ctx.clone(), repository.clone(), listed.id);
        ctx.spawn(watcher.run(cancel));
    }

    #[must_use]
    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Latest non-terminal snapshot.
    #[must_use]
    pub fn previous(&self) -> Option<&PullRequest> {
        self.previous.as_ref()
    }

    /// Run one poll-diff-emit cycle.
    pub async fn tick(&mut self) -> TickOutcome {
        let latest = match self
            .ctx
            .fetcher()
            .pull_request(&self.repository, self.pull_request_id)
            .await
        {
            Ok(latest) => latest,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    repository = %self.repository.name,
                    pull_request_id = self.pull_request_id,
                    "Failed to fetch pull request"
                );
                return TickOutcome::Continue;
            }
        };

        for change in diff_pull_request(self.previous.as_ref(), &latest) {
            self.ctx.emit(&self.repository, self.pull_request_id, change);
        }

        if latest.status.is_terminal() {
            self.ctx.emit(
                &self.repository,
                self.pull_request_id,
                Change::PullRequestClosed {
                    status: latest.status,
                },
            );
            self.previous = None;
            self.state = WatchState::Stopped;
            return TickOutcome::Terminal;
        }

        self.previous = Some(latest);
        self.state = WatchState::Tracking;
        TickOutcome::Continue
    }

    /// Poll immediately, then on every interval tick until a terminal status
    /// is seen or `cancel` fires. Terminal status cancels `cancel`.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = self.ctx.ticker();

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let _permit = self.ctx.admit().await;
                    if self.tick().await == TickOutcome::Terminal {
                        cancel.cancel();
                        break;
                    }
                }
            }
        }

        tracing::debug!(
            repository = %self.repository.name,
            pull_request_id = self.pull_request_id,
            state = ?self.state,
            "Pull request watcher stopped"
        );
    }
}
