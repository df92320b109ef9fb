//! Azure DevOps entity records.
//!
//! Field names follow the REST API wire format; only the fields the watchers
//! diff or report are decoded.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Envelope used by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiList<T> {
    pub value: Vec<T>,
}

/// A git repository in the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
}

/// A user identity (pull request creator, comment author).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub unique_name: String,
}

/// A reviewer's disposition on a pull request.
///
/// The service encodes votes as integers. Values outside the four known
/// dispositions are kept verbatim in [`Vote::Other`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Vote {
    Approved,
    ApprovedWithSuggestions,
    #[default]
    NoVote,
    Rejected,
    Other(i64),
}

impl Vote {
    /// Whether the reviewer has cast any vote at all.
    #[must_use]
    pub fn is_cast(self) -> bool {
        self != Self::NoVote
    }

    #[must_use]
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Approved => 10,
            Self::ApprovedWithSuggestions => 5,
            Self::NoVote => 0,
            Self::Rejected => -10,
            Self::Other(value) => value,
        }
    }
}

impl From<i64> for Vote {
    fn from(value: i64) -> Self {
        match value {
            10 => Self::Approved,
            5 => Self::ApprovedWithSuggestions,
            0 => Self::NoVote,
            -10 => Self::Rejected,
            other => Self::Other(other),
        }
    }
}

impl From<Vote> for i64 {
    fn from(vote: Vote) -> Self {
        vote.as_i64()
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => f.write_str("approved"),
            Self::ApprovedWithSuggestions => f.write_str("approved with suggestions"),
            Self::NoVote => f.write_str("no vote"),
            Self::Rejected => f.write_str("rejected"),
            Self::Other(-5) => f.write_str("waiting for author"),
            Self::Other(value) => write!(f, "vote {value}"),
        }
    }
}

/// A reviewer entry on a pull request. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub unique_name: String,
    #[serde(default)]
    pub vote: Vote,
}

/// Lifecycle status of a pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PullRequestStatus {
    NotSet,
    #[default]
    Active,
    Abandoned,
    Completed,
    #[serde(other)]
    Unknown,
}

impl PullRequestStatus {
    /// Whether no further activity can happen on the pull request.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Abandoned | Self::Completed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotSet => "notSet",
            Self::Active => "active",
            Self::Abandoned => "abandoned",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRef {
    pub commit_id: String,
}

/// A pull request, either from the repository listing or the detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    #[serde(rename = "pullRequestId")]
    pub id: u64,
    #[serde(rename = "createdBy")]
    pub author: Identity,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reviewers: Vec<Reviewer>,
    #[serde(default)]
    pub status: PullRequestStatus,
    #[serde(rename = "sourceRefName", default)]
    pub source_ref: String,
    #[serde(rename = "targetRefName", default)]
    pub target_ref: String,
    #[serde(default)]
    pub last_merge_source_commit: Option<CommitRef>,
}

impl PullRequest {
    /// Commit id of the source branch head the service last merged.
    #[must_use]
    pub fn last_merge_source_commit_id(&self) -> Option<&str> {
        self.last_merge_source_commit
            .as_ref()
            .map(|commit| commit.commit_id.as_str())
    }
}

/// Kind of a thread comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentType {
    #[default]
    Text,
    CodeChange,
    /// Generated by the service ("reviewer added", "policy passed", ...).
    System,
    #[serde(other)]
    Unknown,
}

/// A comment inside a discussion thread. Identity is `id` within the thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Identity,
    #[serde(default)]
    pub comment_type: CommentType,
}

impl Comment {
    /// Comment body, with absent content read as empty.
    #[must_use]
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// A discussion thread on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}
