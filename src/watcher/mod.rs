//! Change-detection polling engine.
//!
//! Watchers form a tree: the root supervisor starts one repository watcher per
//! repository, each repository watcher starts a pull request watcher (with a
//! nested thread watcher) per pull request of interest. Every watcher owns its
//! snapshot, polls on an interval, diffs and emits [`ReviewEvent`]s.

mod context;
mod diff;
mod error;
mod event;
mod filter;
mod pull_request;
mod repository;
mod spawner;
mod supervisor;
mod thread;

pub use context::WatchContext;
pub use diff::{diff_pull_request, diff_threads, diff_votes, merge_threads, ThreadSnapshot};
pub use error::SupervisorError;
pub use event::{Change, ChannelSink, EventSink, JsonSink, ReviewEvent, TracingSink};
pub use filter::{is_pull_request_of_interest, is_repository_of_interest};
pub use pull_request::{PullRequestWatcher, TickOutcome, WatchState};
pub use repository::RepositoryWatcher;
pub use spawner::{BoundedSpawner, TaskSpawner, TickPermit, TokioSpawner};
pub use supervisor::RootSupervisor;
pub use thread::ThreadWatcher;
