//! The prep and release state machines.
//!
//! Both orchestrators are written against the collaborator traits only, so a
//! run can be replayed against in-memory fakes. Every mutating step is fenced
//! by an existence check (branch, pull request, merge state), which makes a
//! crashed or timed-out run safe to repeat with the same arguments.

mod policy;
mod prep;
mod release;

pub use policy::{DEFAULT_MERGE_TIMEOUT, DEFAULT_POLL_INTERVAL, Deadline, MergePolicy};
pub use prep::{PrepOrchestrator, PrepOutcome};
pub use release::{FinalizedRelease, ReleaseOrchestrator, ReleaseOutcome};

use crate::error::Result;
use crate::git::{GitOperations, RepositoryCloner};
use crate::github::HostingClient;
use crate::metadata::MetadataStore;
use crate::transform::Templates;
use chrono::NaiveDate;
use log::debug;
use std::path::PathBuf;

/// Handles shared by both orchestrators for one invocation
pub struct Collaborators<C, H, M> {
    /// Produces working copies
    pub cloner: C,
    /// Hosting provider account
    pub hosting: H,
    /// Cross-run key/value store and annotations
    pub metadata: M,
    /// PR and release note templates
    pub templates: Templates,
    /// Date stamped into changelog headings
    pub today: NaiveDate,
    /// Merge wait interval and deadline
    pub policy: MergePolicy,
}

impl<C, H, M> Collaborators<C, H, M>
where
    C: RepositoryCloner,
    H: HostingClient,
    M: MetadataStore,
{
    /// Bundle collaborators with today's local date and the default policy
    pub fn new(cloner: C, hosting: H, metadata: M) -> Result<Self> {
        Ok(Self {
            cloner,
            hosting,
            metadata,
            templates: Templates::new()?,
            today: chrono::Local::now().date_naive(),
            policy: MergePolicy::default(),
        })
    }

    /// Override the changelog date
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Override the merge wait policy
    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Stage every edited file
async fn stage_all<G: GitOperations>(git: &G, files: &[PathBuf]) -> Result<()> {
    for file in files {
        debug!("Staging {}", file.display());
        git.stage_file(file).await?;
    }
    Ok(())
}
