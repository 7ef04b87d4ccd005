//! Core Git operations trait and the scoped working copy.
//!
//! This module defines the GitOperations trait that specifies every Git
//! operation the orchestrators need. The implementation used in production is
//! [`SystemGit`](super::SystemGit); tests substitute an in-memory fake.

use crate::error::Result;
use log::{debug, warn};
use std::future::Future;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Operations on one local checkout of one repository
pub trait GitOperations {
    /// Root of the working tree
    fn path(&self) -> &Path;

    /// Fetch all branches from origin
    fn fetch(&self) -> impl Future<Output = Result<()>>;

    /// Check whether `origin/<branch>` exists in the remote-tracking namespace
    fn branch_exists(&self, branch: &str) -> impl Future<Output = Result<bool>>;

    /// Check out `origin/<branch>`, discarding local changes.
    /// Fails with `BranchNotFound` if the branch is absent.
    fn checkout_remote_branch(&self, branch: &str) -> impl Future<Output = Result<()>>;

    /// Stage a file relative to the working tree root
    fn stage_file(&self, path: &Path) -> impl Future<Output = Result<()>>;

    /// Commit the index. Fails with `NothingToCommit` on a clean index.
    fn commit(&self, message: &str) -> impl Future<Output = Result<()>>;

    /// Push HEAD to `origin/<branch>`, overwriting its history
    fn force_push(&self, branch: &str) -> impl Future<Output = Result<()>>;

    /// Full SHA of HEAD
    fn head_commit_sha(&self) -> impl Future<Output = Result<String>>;
}

/// Produces working copies bound to a remote repository
pub trait RepositoryCloner {
    /// Repository handle type
    type Repo: GitOperations;

    /// Clone `remote_url`, or reuse a checkout left at the same location
    fn clone_or_open(
        &self,
        remote_url: &str,
    ) -> impl Future<Output = Result<WorkingCopy<Self::Repo>>>;
}

/// Exclusively-owned checkout whose directory is removed when it goes out of
/// scope, on success, error and unwind alike.
#[derive(Debug)]
pub struct WorkingCopy<R> {
    repo: R,
    root: PathBuf,
    remove_on_drop: bool,
}

impl<R: GitOperations> WorkingCopy<R> {
    /// Wrap a repository whose directory should be deleted on drop
    pub fn new(repo: R) -> Self {
        let root = repo.path().to_path_buf();
        Self {
            repo,
            root,
            remove_on_drop: true,
        }
    }

    /// Wrap a repository whose directory outlives the run
    pub fn persistent(repo: R) -> Self {
        let root = repo.path().to_path_buf();
        Self {
            repo,
            root,
            remove_on_drop: false,
        }
    }

    /// Resolve a path relative to the working tree root
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

impl<R> Deref for WorkingCopy<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.repo
    }
}

impl<R> Drop for WorkingCopy<R> {
    fn drop(&mut self) {
        if !self.remove_on_drop || !self.root.exists() {
            return;
        }

        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => debug!("Removed working copy {}", self.root.display()),
            Err(e) => warn!(
                "Failed to remove working copy {}: {}. You may need to remove it manually.",
                self.root.display(),
                e
            ),
        }
    }
}
