//! Hosting provider operations trait.
//!
//! Every call is a single network round-trip; retry and backoff policy belongs
//! to the caller.

use crate::error::Result;
use crate::github::{
    DraftRelease, MergeMethod, MergeResult, MergeState, PullRequestRecord, ReleaseDraft,
    RepositoryHandle,
};
use std::future::Future;

/// Operations against one hosting-provider account
pub trait HostingClient {
    /// Resolve `https://github.com/<owner>/<repo>` to a repository handle
    fn repository_from_url(&self, url: &str) -> impl Future<Output = Result<RepositoryHandle>>;

    /// Find an open pull request from `org:head` into `base`
    fn find_pull_request(
        &self,
        repo: &RepositoryHandle,
        org: &str,
        head: &str,
        base: &str,
    ) -> impl Future<Output = Result<Option<PullRequestRecord>>>;

    /// Open a pull request. Fails with `NoCommitsBetween` when head and base
    /// point at the same history.
    fn create_pull_request(
        &self,
        repo: &RepositoryHandle,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> impl Future<Output = Result<PullRequestRecord>>;

    /// Query merge readiness of a pull request
    fn merge_state(
        &self,
        repo: &RepositoryHandle,
        pull_request: u64,
    ) -> impl Future<Output = Result<MergeState>>;

    /// Merge a pull request. Fails with `NotMergeable` when the remote refuses.
    fn merge(
        &self,
        repo: &RepositoryHandle,
        pull_request: u64,
        method: MergeMethod,
        commit_message: &str,
    ) -> impl Future<Output = Result<MergeResult>>;

    /// Find a release (draft or published) by tag. Drafts are only visible
    /// to tokens with push access.
    fn find_release_by_tag(
        &self,
        repo: &RepositoryHandle,
        tag: &str,
    ) -> impl Future<Output = Result<Option<DraftRelease>>>;

    /// Create an unpublished release
    fn create_draft_release(
        &self,
        repo: &RepositoryHandle,
        draft: &ReleaseDraft,
    ) -> impl Future<Output = Result<DraftRelease>>;
}
