//! Records exchanged with the hosting provider.

use std::fmt;

/// A resolved remote repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    /// Owner login (organization or user)
    pub owner: String,
    /// Repository name
    pub name: String,
    /// URL used to clone the repository
    pub clone_url: String,
}

/// Merge readiness of a pull request as reported by the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    /// Mergeability has not been computed yet
    Unknown,
    /// Checks passed and reviews are in place
    ReadyToMerge,
    /// Something (checks, reviews, conflicts) is holding the PR back
    Blocked,
    /// The PR has already been merged
    AlreadyMerged,
}

impl fmt::Display for MergeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MergeState::Unknown => "unknown",
            MergeState::ReadyToMerge => "ready to merge",
            MergeState::Blocked => "blocked",
            MergeState::AlreadyMerged => "already merged",
        };
        f.write_str(text)
    }
}

/// Snapshot of a pull request. Never cached past one polling iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    /// Pull request number
    pub id: u64,
    /// Branch being merged
    pub head_branch: String,
    /// Branch being merged into
    pub base_branch: String,
    /// Browser URL
    pub html_url: String,
    /// Merge readiness at the time of the read
    pub merge_state: MergeState,
}

/// How a pull request is merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMethod {
    /// Create a merge commit
    #[default]
    Merge,
    /// Squash into a single commit
    Squash,
    /// Rebase onto the base branch
    Rebase,
}

/// Outcome of a merge call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Whether the remote reports the PR as merged
    pub merged: bool,
    /// Merge commit SHA, when one was created
    pub sha: Option<String>,
}

/// Parameters for a draft release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDraft {
    /// Tag to create on publish
    pub tag: String,
    /// Release title
    pub name: String,
    /// Markdown body
    pub body: String,
    /// Commit the tag will point at
    pub target_commit: String,
}

/// A release created on the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRelease {
    /// Release ID
    pub id: u64,
    /// Browser URL
    pub html_url: String,
}
