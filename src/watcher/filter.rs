//! Interest filters deciding which repositories and pull requests get a watcher.

use crate::api::{PullRequest, Repository};

/// Whether a repository should be watched.
///
/// An empty allow-list matches every repository.
#[must_use]
pub fn is_repository_of_interest(repository: &Repository, allowed_names: &[String]) -> bool {
    allowed_names.is_empty() || allowed_names.iter().any(|name| *name == repository.name)
}

/// Whether a pull request should be watched.
///
/// An empty allow-list matches every pull request. Otherwise the author or at
/// least one reviewer must be in the list, compared by unique name.
#[must_use]
pub fn is_pull_request_of_interest(pull_request: &PullRequest, allowed_users: &[String]) -> bool {
    if allowed_users.is_empty() {
        return true;
    }

    let listed = |unique_name: &str| allowed_users.iter().any(|user| user == unique_name);

    listed(pull_request.author.unique_name.as_str())
        || pull_request
            .reviewers
            .iter()
            .any(|reviewer| listed(reviewer.unique_name.as_str()))
}
