//! Semantic diffs between two snapshots of the same entity.
//!
//! Every function here is pure: it compares a previous snapshot (absent on the
//! first observation) with the latest one and returns the changes worth
//! reporting. Callers own snapshot replacement.

use std::collections::HashMap;

use crate::api::{Comment, CommentType, PullRequest, Reviewer, Thread};

use super::event::Change;

/// Discussion threads of one pull request, keyed by thread id.
pub type ThreadSnapshot = HashMap<u64, Thread>;

/// Diff the pull request detail.
///
/// With a previous snapshot, reports status and source-commit changes followed
/// by vote changes. Without one, only the votes already cast are reported.
#[must_use]
pub fn diff_pull_request(previous: Option<&PullRequest>, latest: &PullRequest) -> Vec<Change> {
    let mut changes = Vec::new();

    if let Some(previous) = previous {
        if previous.status != latest.status {
            changes.push(Change::StatusChanged {
                old: previous.status,
                new: latest.status,
            });
        }

        let old_commit = previous.last_merge_source_commit_id();
        let new_commit = latest.last_merge_source_commit_id();
        if old_commit != new_commit {
            changes.push(Change::NewCommits {
                old_commit: old_commit.map(str::to_owned),
                new_commit: new_commit.map(str::to_owned),
            });
        }
    }

    changes.extend(diff_votes(
        previous.map(|pr| pr.reviewers.as_slice()),
        &latest.reviewers,
    ));
    changes
}

/// Diff reviewer votes, matching reviewers by id.
///
/// Reviewers without a vote never produce a change. A vote where the reviewer
/// previously had none (unknown reviewer, first observation, or `NoVote`) is
/// reported as added; a different non-absent vote is reported as changed.
#[must_use]
pub fn diff_votes(previous: Option<&[Reviewer]>, latest: &[Reviewer]) -> Vec<Change> {
    latest
        .iter()
        .filter(|reviewer| reviewer.vote.is_cast())
        .filter_map(|reviewer| {
            let prior_vote = previous
                .and_then(|reviewers| reviewers.iter().find(|prior| prior.id == reviewer.id))
                .map(|prior| prior.vote)
                .filter(|vote| vote.is_cast());

            match prior_vote {
                None => Some(Change::VoteAdded {
                    reviewer: reviewer.display_name.clone(),
                    vote: reviewer.vote,
                }),
                Some(old) if old != reviewer.vote => Some(Change::VoteChanged {
                    reviewer: reviewer.display_name.clone(),
                    old,
                    new: reviewer.vote,
                }),
                Some(_) => None,
            }
        })
        .collect()
}

/// Diff discussion threads and their comments.
///
/// Threads without a status are ignored. Comment deletions are not reported.
#[must_use]
pub fn diff_threads(previous: &ThreadSnapshot, latest: &[Thread]) -> Vec<Change> {
    let mut changes = Vec::new();

    for thread in latest {
        let Some(status) = thread.status.as_deref() else {
            continue;
        };

        let prior = previous.get(&thread.id);
        match prior {
            None => changes.push(Change::ThreadCreated {
                thread_id: thread.id,
                status: status.to_string(),
            }),
            Some(prior) if prior.status.as_deref() != Some(status) => {
                changes.push(Change::ThreadStatusChanged {
                    thread_id: thread.id,
                    old: prior.status.clone().unwrap_or_default(),
                    new: status.to_string(),
                });
            }
            Some(_) => {}
        }

        let prior_comments = prior.map_or(&[][..], |prior| prior.comments.as_slice());
        diff_comments(thread.id, prior_comments, &thread.comments, &mut changes);
    }

    changes
}

fn diff_comments(thread_id: u64, previous: &[Comment], latest: &[Comment], out: &mut Vec<Change>) {
    for comment in latest {
        if comment.comment_type == CommentType::System {
            continue;
        }

        match previous.iter().find(|prior| prior.id == comment.id) {
            None => out.push(Change::CommentCreated {
                thread_id,
                comment_id: comment.id,
                author: comment.author.display_name.clone(),
                content: comment.text().to_string(),
            }),
            Some(prior) if prior.text() != comment.text() => out.push(Change::CommentUpdated {
                thread_id,
                comment_id: comment.id,
                author: comment.author.display_name.clone(),
                old_content: prior.text().to_string(),
                new_content: comment.text().to_string(),
            }),
            Some(_) => {}
        }
    }
}

/// Replace the snapshot entry of every status-bearing thread with its latest
/// version.
pub fn merge_threads(snapshot: &mut ThreadSnapshot, latest: Vec<Thread>) {
    for thread in latest {
        if thread.status.is_some() {
            snapshot.insert(thread.id, thread);
        }
    }
}
