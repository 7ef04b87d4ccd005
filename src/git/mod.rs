//! Git operations for release workflows.
//!
//! This module exposes the [`GitOperations`] seam the orchestrators are written
//! against, the [`WorkingCopy`] scope guard, and the system git backend.

mod operations;
mod system_git;

pub use operations::{GitOperations, RepositoryCloner, WorkingCopy};
pub use system_git::{SystemGit, SystemGitCloner};
