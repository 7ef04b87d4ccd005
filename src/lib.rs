//! # release_tool
//!
//! Release orchestration for a family of repositories that ship in lockstep.
//!
//! `prep` cuts a release candidate branch with repository-specific edits
//! (changelog heading, version files, plugin descriptor) and opens a PR into
//! the release branch. `release` waits for that PR to become mergeable, merges
//! it, drafts a GitHub release and opens a PR carrying the release branch back
//! into the source branch.
//!
//! Runs communicate through a pipeline metadata store (Buildkite agent
//! metadata, or a JSON file for local runs). Every mutating step is guarded by
//! an existence check, so re-running a failed command is always safe.
//!
//! ## Usage
//!
//! ```bash
//! release_tool prep 0.12.0 --source-branch master --candidate-branch 0.12.0-rc \
//!     --release-branch release --git-repository-name UnrealGDK --github-organization spatialos
//! release_tool release 0.12.0 --pull-request-url https://github.com/spatialos/UnrealGDK/pull/1 ...
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod error;
pub mod git;
pub mod github;
pub mod identity;
pub mod metadata;
pub mod orchestrator;
pub mod transform;

pub use cli::Args;
pub use error::{ReleaseError, Result};
pub use git::{GitOperations, RepositoryCloner, WorkingCopy};
pub use github::HostingClient;
pub use identity::ReleaseIdentity;
pub use metadata::MetadataStore;
pub use orchestrator::{Collaborators, MergePolicy, PrepOrchestrator, ReleaseOrchestrator};
pub use transform::RepoStrategy;
