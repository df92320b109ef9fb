//! Review events and the sinks they are delivered to.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::api::{PullRequestStatus, Vote};

/// A single reportable difference between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    /// A pull request of interest was discovered and is now tracked.
    PullRequestWatched {
        author: String,
        title: String,
        description: String,
        status: PullRequestStatus,
        source_ref: String,
        target_ref: String,
    },
    StatusChanged {
        old: PullRequestStatus,
        new: PullRequestStatus,
    },
    /// The source branch head moved.
    NewCommits {
        old_commit: Option<String>,
        new_commit: Option<String>,
    },
    /// A reviewer cast a vote where there was none.
    VoteAdded { reviewer: String, vote: Vote },
    /// A reviewer replaced one vote with another.
    VoteChanged {
        reviewer: String,
        old: Vote,
        new: Vote,
    },
    ThreadCreated { thread_id: u64, status: String },
    ThreadStatusChanged {
        thread_id: u64,
        old: String,
        new: String,
    },
    CommentCreated {
        thread_id: u64,
        comment_id: u64,
        author: String,
        content: String,
    },
    CommentUpdated {
        thread_id: u64,
        comment_id: u64,
        author: String,
        old_content: String,
        new_content: String,
    },
    /// The pull request reached a terminal status; tracking ends.
    PullRequestClosed { status: PullRequestStatus },
    /// The pull request disappeared from the repository listing; tracking ends.
    PullRequestUnwatched,
}

impl Change {
    /// Short human-readable description of the change kind.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self {
            Self::PullRequestWatched { .. } => "Watching PR",
            Self::StatusChanged { .. } => "PR status changed",
            Self::NewCommits { .. } => "PR has new commits",
            Self::VoteAdded { .. } => "PR has a new reviewer vote",
            Self::VoteChanged { .. } => "PR has an updated reviewer vote",
            Self::ThreadCreated { .. } => "New thread",
            Self::ThreadStatusChanged { .. } => "Thread status changed",
            Self::CommentCreated { .. } => "New comment",
            Self::CommentUpdated { .. } => "Updated comment",
            Self::PullRequestClosed { .. } => "PR closed, no longer watching",
            Self::PullRequestUnwatched => "PR no longer listed, no longer watching",
        }
    }
}

/// A change attributed to the pull request it happened on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewEvent {
    pub repository: String,
    pub pull_request_id: u64,
    #[serde(flatten)]
    pub change: Change,
}

impl ReviewEvent {
    #[must_use]
    pub fn new(repository: impl Into<String>, pull_request_id: u64, change: Change) -> Self {
        Self {
            repository: repository.into(),
            pull_request_id,
            change,
        }
    }
}

/// Destination for review events.
///
/// Called from many watcher tasks at once; implementations must not block
/// for long.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ReviewEvent);
}

/// Emits every event as a structured `tracing` record at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ReviewEvent) {
        let repository = event.repository.as_str();
        let pull_request_id = event.pull_request_id;
        let message = event.change.summary();

        match &event.change {
            Change::PullRequestWatched {
                author,
                title,
                description,
                status,
                source_ref,
                target_ref,
            } => tracing::info!(
                repository,
                pull_request_id,
                author = %author,
                title = %title,
                description = %description,
                status = %status,
                source_ref = %source_ref,
                target_ref = %target_ref,
                "{message}"
            ),
            Change::StatusChanged { old, new } => tracing::info!(
                repository,
                pull_request_id,
                old_status = %old,
                new_status = %new,
                "{message}"
            ),
            Change::NewCommits {
                old_commit,
                new_commit,
            } => tracing::info!(
                repository,
                pull_request_id,
                old_commit = old_commit.as_deref().unwrap_or_default(),
                new_commit = new_commit.as_deref().unwrap_or_default(),
                "{message}"
            ),
            Change::VoteAdded { reviewer, vote } => tracing::info!(
                repository,
                pull_request_id,
                reviewer = %reviewer,
                vote = %vote,
                "{message}"
            ),
            Change::VoteChanged { reviewer, old, new } => tracing::info!(
                repository,
                pull_request_id,
                reviewer = %reviewer,
                old_vote = %old,
                new_vote = %new,
                "{message}"
            ),
            Change::ThreadCreated { thread_id, status } => tracing::info!(
                repository,
                pull_request_id,
                thread_id,
                status = %status,
                "{message}"
            ),
            Change::ThreadStatusChanged { thread_id, old, new } => tracing::info!(
                repository,
                pull_request_id,
                thread_id,
                old_status = %old,
                new_status = %new,
                "{message}"
            ),
            Change::CommentCreated {
                thread_id,
                comment_id,
                author,
                content,
            } => tracing::info!(
                repository,
                pull_request_id,
                thread_id,
                comment_id,
                author = %author,
                content = %content,
                "{message}"
            ),
            Change::CommentUpdated {
                thread_id,
                comment_id,
                author,
                old_content,
                new_content,
            } => tracing::info!(
                repository,
                pull_request_id,
                thread_id,
                comment_id,
                author = %author,
                old_content = %old_content,
                new_content = %new_content,
                "{message}"
            ),
            Change::PullRequestClosed { status } => tracing::info!(
                repository,
                pull_request_id,
                status = %status,
                "{message}"
            ),
            Change::PullRequestUnwatched => {
                tracing::info!(repository, pull_request_id, "{message}");
            }
        }
    }
}

#[derive(Serialize)]
struct TimestampedEvent<'a> {
    at: DateTime<Utc>,
    #[serde(flatten)]
    event: &'a ReviewEvent,
}

/// Prints one JSON object per event on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink;

impl JsonSink {
    /// Render an event as a single JSON line stamped with `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be serialized.
    pub fn render(event: &ReviewEvent, at: DateTime<Utc>) -> Result<String, serde_json::Error> {
        serde_json::to_string(&TimestampedEvent { at, event })
    }
}

impl EventSink for JsonSink {
    fn emit(&self, event: ReviewEvent) {
        match Self::render(&event, Utc::now()) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize event"),
        }
    }
}

/// Forwards events into a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ReviewEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver its events arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReviewEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ReviewEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Event receiver dropped");
        }
    }
}
