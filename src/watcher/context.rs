//! Collaborators shared by every watcher.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::time::{Interval, MissedTickBehavior};

use crate::api::{Repository, SnapshotFetcher};

use super::event::{Change, EventSink, ReviewEvent};
use super::spawner::{TaskSpawner, TickPermit};

/// Fetcher, sink, spawner and settings handed down from the root supervisor.
///
/// Cloning is cheap; only immutable, shared collaborators live here. Snapshot
/// state stays inside each watcher.
#[derive(Clone)]
pub struct WatchContext {
    fetcher: Arc<dyn SnapshotFetcher>,
    sink: Arc<dyn EventSink>,
    spawner: Arc<dyn TaskSpawner>,
    interval: Duration,
    users: Arc<[String]>,
}

impl WatchContext {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn SnapshotFetcher>,
        sink: Arc<dyn EventSink>,
        spawner: Arc<dyn TaskSpawner>,
        interval: Duration,
        users: Vec<String>,
    ) -> Self {
        Self {
            fetcher,
            sink,
            spawner,
            interval,
            users: users.into(),
        }
    }

    #[must_use]
    pub fn fetcher(&self) -> &dyn SnapshotFetcher {
        self.fetcher.as_ref()
    }

    /// Poll interval of every watcher.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Users whose pull requests are of interest; empty means everyone.
    #[must_use]
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Report a change on a pull request.
    pub fn emit(&self, repository: &Repository, pull_request_id: u64, change: Change) {
        self.sink
            .emit(ReviewEvent::new(repository.name.clone(), pull_request_id, change));
    }

    /// Start a watcher task.
    pub fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.spawner.spawn(task.boxed());
    }

    /// Wait for the spawner to admit one tick.
    pub async fn admit(&self) -> TickPermit {
        self.spawner.admit().await
    }

    /// Timer whose first tick completes immediately; late ticks are delayed,
    /// never bunched.
    #[must_use]
    pub fn ticker(&self) -> Interval {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}

impl std::fmt::Debug for WatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchContext")
            .field("interval", &self.interval)
            .field("users", &self.users)
            .finish_non_exhaustive()
    }
}
