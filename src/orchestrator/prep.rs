//! Cutting a release candidate and opening its PR into the release branch.

use super::{Collaborators, stage_all};
use crate::error::{GitError, ReleaseError, Result};
use crate::git::{GitOperations, RepositoryCloner};
use crate::github::{HostingClient, PullRequestRecord};
use crate::identity::ReleaseIdentity;
use crate::metadata::{
    AnnotationLevel, CANDIDATE_PRS_CONTEXT, GDK_SOURCE_BRANCH_KEY, MetadataStore, pr_url_key,
};
use crate::transform::{GDK_REPOSITORY, PullRequestBody, RepoStrategy};
use log::{info, warn};

const CANDIDATE_COMMIT_MESSAGE: &str = "Release candidate for version";

/// Terminal state of a prep run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepOutcome {
    /// The release branch does not exist yet; release will push it directly
    NoReleaseBranch,
    /// A candidate-into-release PR is open (created or reused)
    PullRequest(PullRequestRecord),
}

/// Prepares one repository's release candidate
pub struct PrepOrchestrator<'a, C, H, M> {
    identity: &'a ReleaseIdentity,
    deps: &'a Collaborators<C, H, M>,
}

impl<'a, C, H, M> PrepOrchestrator<'a, C, H, M>
where
    C: RepositoryCloner,
    H: HostingClient,
    M: MetadataStore,
{
    /// Orchestrator for `identity` using `deps`
    pub fn new(identity: &'a ReleaseIdentity, deps: &'a Collaborators<C, H, M>) -> Self {
        Self { identity, deps }
    }

    /// Run `Start → EnsureCandidate → EnsureReleaseBranch → EnsurePR → Annotate`
    pub async fn run(&self) -> Result<PrepOutcome> {
        let identity = self.identity;
        let strategy = RepoStrategy::for_repository(&identity.repository)?;
        strategy.validate_prep(identity)?;
        let remote_url = identity.remote_url();

        // 1. Clone the repository (removed again when `working` drops)
        let working = self.deps.cloner.clone_or_open(&remote_url).await?;

        // 2. Candidate branch; its existence is the fence
        if working.branch_exists(&identity.candidate_branch).await? {
            info!(
                "Candidate branch {} already exists, skipping candidate edits",
                identity.candidate_branch
            );
        } else {
            self.create_candidate(strategy, &*working).await?;
        }

        // 3. No release branch means the PR-less release path
        if !working.branch_exists(&identity.release_branch).await? {
            info!(
                "The release branch {} does not exist! Going ahead with the PR-less release process.",
                identity.release_branch
            );
            let annotation = format!(
                "* Successfully created a [release candidate branch]({}) in the repo `{}`, \
                 and it will eventually become `{}` (no pull request as the specified release \
                 branch did not exist for this repository).\n",
                identity.tree_url(&identity.candidate_branch),
                identity.repository,
                identity.release_branch
            );
            self.deps
                .metadata
                .annotate(AnnotationLevel::Info, CANDIDATE_PRS_CONTEXT, &annotation, true)
                .await?;
            return Ok(PrepOutcome::NoReleaseBranch);
        }

        // 4. PR from candidate into release, reused if already open
        let repo = self.deps.hosting.repository_from_url(&remote_url).await?;
        let existing = self
            .deps
            .hosting
            .find_pull_request(
                &repo,
                &identity.organization,
                &identity.candidate_branch,
                &identity.release_branch,
            )
            .await?;

        let pull_request = match existing {
            Some(pull_request) => {
                info!("Reusing open pull request {}", pull_request.html_url);
                pull_request
            }
            None => {
                info!("No PR exists. Attempting to open a new PR");
                let body = self.pull_request_body(strategy).await?;
                self.deps
                    .hosting
                    .create_pull_request(
                        &repo,
                        &identity.candidate_branch,
                        &identity.release_branch,
                        &format!("Release {}", identity.version),
                        &body,
                    )
                    .await?
            }
        };

        // 5. Publish the PR for dependent repositories and for humans
        self.deps
            .metadata
            .set_metadata(
                &pr_url_key(&identity.repository, &identity.source_branch),
                &pull_request.html_url,
            )
            .await?;

        let annotation = format!(
            "* Successfully created a [pull request]({}) in the repo `{}` from `{}` into `{}`. \
             Your human labour is now required to complete the tasks listed in the PR \
             descriptions and unblock the pipeline and resume the release.\n",
            pull_request.html_url,
            identity.repository,
            identity.candidate_branch,
            identity.release_branch
        );
        self.deps
            .metadata
            .annotate(AnnotationLevel::Info, CANDIDATE_PRS_CONTEXT, &annotation, true)
            .await?;

        info!("Pull request available: {}", pull_request.html_url);
        Ok(PrepOutcome::PullRequest(pull_request))
    }

    /// Check out the source branch, apply the repository's edits, commit and
    /// force-push the result as the candidate branch
    async fn create_candidate<G: GitOperations>(
        &self,
        strategy: &RepoStrategy,
        git: &G,
    ) -> Result<()> {
        let identity = self.identity;
        git.checkout_remote_branch(&identity.source_branch).await?;

        let changed = strategy.apply_prep_edits(git.path(), identity, self.deps.today)?;
        stage_all(git, &changed).await?;

        let message = format!("{} {}.", CANDIDATE_COMMIT_MESSAGE, identity.version);
        match git.commit(&message).await {
            Ok(()) => {}
            Err(ReleaseError::Git(GitError::NothingToCommit)) => {
                warn!(
                    "Source branch {} already carries the release edits, pushing it unchanged",
                    identity.source_branch
                );
            }
            Err(e) => return Err(e),
        }

        git.force_push(&identity.candidate_branch).await?;
        info!(
            "Release candidate head hash: {}",
            git.head_commit_sha().await?
        );
        Ok(())
    }

    async fn pull_request_body(&self, strategy: &RepoStrategy) -> Result<String> {
        let identity = self.identity;
        let templates = &self.deps.templates;

        match strategy.pull_request_body {
            PullRequestBody::Checklist => {
                templates.checklist_pr_body(&identity.candidate_branch, &identity.release_branch)
            }
            PullRequestBody::LinkedToGdk => {
                let metadata = &self.deps.metadata;
                let gdk_source_branch = metadata.get_metadata(GDK_SOURCE_BRANCH_KEY).await?;
                let gdk_pull_request_url = metadata
                    .get_metadata(&pr_url_key(GDK_REPOSITORY, &gdk_source_branch))
                    .await?;
                templates.linked_pr_body(
                    &identity.candidate_branch,
                    &identity.release_branch,
                    &gdk_pull_request_url,
                )
            }
        }
    }
}
