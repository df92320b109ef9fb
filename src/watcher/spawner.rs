//! Task spawning strategies for watcher fan-out.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::task::TaskTracker;

/// Starts watcher tasks and admits their ticks.
///
/// Watchers never call `tokio::spawn` directly, so the fan-out strategy can be
/// swapped without touching watcher logic. A watcher holds the permit returned
/// by [`TaskSpawner::admit`] for the length of one tick and drops it before
/// waiting for the next one.
pub trait TaskSpawner: Send + Sync {
    fn spawn(&self, task: BoxFuture<'static, ()>);

    /// Wait until one more tick may run.
    fn admit(&self) -> BoxFuture<'static, TickPermit>;
}

/// Held while a watcher tick runs; dropping it lets another tick in.
#[derive(Debug)]
#[must_use = "the tick is admitted only while the permit is held"]
pub struct TickPermit(Option<OwnedSemaphorePermit>);

impl TickPermit {
    /// Permit that limits nothing.
    pub fn unlimited() -> Self {
        Self(None)
    }
}

/// One tokio task per watcher, ticks without limit.
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner {
    tracker: TaskTracker,
}

impl TokioSpawner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker of every task spawned so far.
    #[must_use]
    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }
}

impl TaskSpawner for TokioSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.tracker.spawn(task);
    }

    fn admit(&self) -> BoxFuture<'static, TickPermit> {
        futures_util::future::ready(TickPermit::unlimited()).boxed()
    }
}

/// One tokio task per watcher, but at most `limit` ticks run at once.
///
/// Watchers are endless loops, so the cap applies to ticks rather than task
/// lifetimes: an idle watcher waiting on its timer holds no permit.
#[derive(Debug, Clone)]
pub struct BoundedSpawner {
    tracker: TaskTracker,
    permits: Arc<Semaphore>,
    limit: usize,
}

impl BoundedSpawner {
    /// Create a spawner allowing `limit` concurrently running ticks.
    ///
    /// A limit of zero is raised to one.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            tracker: TaskTracker::new(),
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Permits not currently held by a running tick.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Tracker of every task spawned so far.
    #[must_use]
    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }
}

impl TaskSpawner for BoundedSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.tracker.spawn(task);
    }

    fn admit(&self) -> BoxFuture<'static, TickPermit> {
        let permits = Arc::clone(&self.permits);
        async move {
            match permits.acquire_owned().await {
                Ok(permit) => TickPermit(Some(permit)),
                Err(_) => {
                    tracing::warn!("Tick permits closed, running without limit");
                    TickPermit::unlimited()
                }
            }
        }
        .boxed()
    }
}
