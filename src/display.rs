//! Colored console rendering of review events.
//!
//! One line per event: timestamp, a colored tag for the change kind, the
//! repository and pull request, then the change details.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::watcher::{Change, EventSink, ReviewEvent};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for comment bodies and descriptions.
const DEFAULT_MAX_LEN: usize = 120;

/// Truncate a string to a maximum length in characters, adding an ellipsis if
/// truncated. Newlines are flattened so every event stays on one line.
#[must_use]
pub fn truncate(s: &str, max_len: usize, raw_mode: bool) -> String {
    let flat = s.replace(['\r', '\n'], " ");
    if raw_mode {
        return flat;
    }
    if flat.chars().count() <= max_len {
        flat
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = flat.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// Tag shown in front of an event.
#[must_use]
pub fn tag(change: &Change) -> &'static str {
    match change {
        Change::PullRequestWatched { .. } => "[PR]",
        Change::StatusChanged { .. } | Change::NewCommits { .. } => "[UPDATE]",
        Change::VoteAdded { .. } | Change::VoteChanged { .. } => "[VOTE]",
        Change::ThreadCreated { .. } | Change::ThreadStatusChanged { .. } => "[THREAD]",
        Change::CommentCreated { .. } | Change::CommentUpdated { .. } => "[COMMENT]",
        Change::PullRequestClosed { .. } | Change::PullRequestUnwatched => "[CLOSED]",
    }
}

/// Plain-text details of a change, without colors.
#[must_use]
pub fn describe(change: &Change, raw_mode: bool) -> String {
    let summary = change.summary();
    match change {
        Change::PullRequestWatched {
            author,
            title,
            description,
            status,
            source_ref,
            target_ref,
        } => {
            let mut line =
                format!("{summary}: \"{title}\" by {author} ({source_ref} -> {target_ref}, {status})");
            if !description.is_empty() {
                line.push_str(" - ");
                line.push_str(&truncate(description, DEFAULT_MAX_LEN, raw_mode));
            }
            line
        }
        Change::StatusChanged { old, new } => format!("{summary}: {old} -> {new}"),
        Change::NewCommits {
            old_commit,
            new_commit,
        } => format!(
            "{summary}: {} -> {}",
            short_commit(old_commit.as_deref(), raw_mode),
            short_commit(new_commit.as_deref(), raw_mode)
        ),
        Change::VoteAdded { reviewer, vote } => format!("{summary}: {reviewer} {vote}"),
        Change::VoteChanged { reviewer, old, new } => {
            format!("{summary}: {reviewer} {old} -> {new}")
        }
        Change::ThreadCreated { thread_id, status } => {
            format!("{summary} #{thread_id} ({status})")
        }
        Change::ThreadStatusChanged {
            thread_id,
            old,
            new,
        } => format!("{summary} #{thread_id}: {old} -> {new}"),
        Change::CommentCreated {
            thread_id,
            author,
            content,
            ..
        } => format!(
            "{summary} in #{thread_id} by {author}: {}",
            truncate(content, DEFAULT_MAX_LEN, raw_mode)
        ),
        Change::CommentUpdated {
            thread_id,
            author,
            old_content,
            new_content,
            ..
        } => format!(
            "{summary} in #{thread_id} by {author}: {} -> {}",
            truncate(old_content, DEFAULT_MAX_LEN, raw_mode),
            truncate(new_content, DEFAULT_MAX_LEN, raw_mode)
        ),
        Change::PullRequestClosed { status } => format!("{summary} ({status})"),
        Change::PullRequestUnwatched => summary.to_string(),
    }
}

fn short_commit(commit: Option<&str>, raw_mode: bool) -> String {
    match commit {
        Some(commit) if raw_mode => commit.to_string(),
        Some(commit) => commit.chars().take(8).collect(),
        None => "none".to_string(),
    }
}

/// Prints colored event lines on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink {
    /// Disable truncation of long values.
    pub raw_mode: bool,
}

impl ConsoleSink {
    #[must_use]
    pub fn new(raw_mode: bool) -> Self {
        Self { raw_mode }
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: ReviewEvent) {
        let tag = tag(&event.change);
        let colored_tag = match &event.change {
            Change::PullRequestWatched { .. } => tag.blue().bold().to_string(),
            Change::StatusChanged { .. } | Change::NewCommits { .. } => {
                tag.cyan().bold().to_string()
            }
            Change::VoteAdded { .. } | Change::VoteChanged { .. } => {
                tag.green().bold().to_string()
            }
            Change::ThreadCreated { .. } | Change::ThreadStatusChanged { .. } => {
                tag.yellow().bold().to_string()
            }
            Change::CommentCreated { .. } | Change::CommentUpdated { .. } => {
                tag.magenta().bold().to_string()
            }
            Change::PullRequestClosed { .. } | Change::PullRequestUnwatched => {
                tag.red().bold().to_string()
            }
        };

        println!(
            "{} {} {} {}",
            timestamp().dimmed(),
            colored_tag,
            format!("{}!{}", event.repository, event.pull_request_id).dimmed(),
            describe(&event.change, self.raw_mode)
        );
        let _ = io::stdout().flush();
    }
}
