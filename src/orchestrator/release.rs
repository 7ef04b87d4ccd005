//! Merging a candidate, drafting the release and opening the cleanup PR.

use super::{Collaborators, Deadline, stage_all};
use crate::error::{GitError, GitHubError, ReleaseError, Result, ValidationError};
use crate::git::{GitOperations, RepositoryCloner, WorkingCopy};
use crate::github::{
    DraftRelease, HostingClient, MergeMethod, MergeState, PullRequestRecord, RepositoryHandle,
};
use crate::identity::{ReleaseIdentity, normalize_pull_request_url, parse_pull_request_url};
use crate::metadata::{
    AnnotationLevel, CLEANUP_PRS_CONTEXT, DRAFT_RELEASES_CONTEXT, MetadataStore,
};
use crate::transform::{RepoStrategy, read_release_notes};
use log::{info, warn};

/// Terminal state of a release run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The PR was merged by an earlier run; the release tail was re-run
    AlreadyMerged(FinalizedRelease),
    /// The release branch was updated and a draft release created
    Released(FinalizedRelease),
}

/// Result of the shared release tail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedRelease {
    /// Draft release awaiting publication
    pub release: DraftRelease,
    /// Whether the release was found from an earlier run instead of created
    pub release_existed: bool,
    /// Cleanup PR, `None` when release and source do not differ
    pub cleanup: Option<PullRequestRecord>,
}

/// What the merge poll loop observed when it stopped
enum Readiness {
    Ready,
    MergedElsewhere,
}

/// Finalizes one repository's release
pub struct ReleaseOrchestrator<'a, C, H, M> {
    identity: &'a ReleaseIdentity,
    deps: &'a Collaborators<C, H, M>,
}

impl<'a, C, H, M> ReleaseOrchestrator<'a, C, H, M>
where
    C: RepositoryCloner,
    H: HostingClient,
    M: MetadataStore,
{
    /// Orchestrator for `identity` using `deps`
    pub fn new(identity: &'a ReleaseIdentity, deps: &'a Collaborators<C, H, M>) -> Self {
        Self { identity, deps }
    }

    /// Release through the PR at `pull_request_url`, or directly from the
    /// candidate branch when no URL is given (blank and `""` count as none)
    pub async fn run(&self, pull_request_url: Option<&str>) -> Result<ReleaseOutcome> {
        let strategy = RepoStrategy::for_repository(&self.identity.repository)?;
        let repo = self
            .deps
            .hosting
            .repository_from_url(&self.identity.remote_url())
            .await?;

        match normalize_pull_request_url(pull_request_url) {
            None => self.release_without_pull_request(strategy, &repo).await,
            Some(url) => self.release_pull_request(strategy, &repo, &url).await,
        }
    }

    async fn release_without_pull_request(
        &self,
        strategy: &RepoStrategy,
        repo: &RepositoryHandle,
    ) -> Result<ReleaseOutcome> {
        let identity = self.identity;
        info!(
            "The passed pull request URL was empty or missing. Trying to release without merging a PR."
        );

        let working = self.deps.cloner.clone_or_open(&identity.remote_url()).await?;
        working.fetch().await?;

        if working.branch_exists(&identity.release_branch).await? {
            warn!(
                "The pull request URL was empty or missing, but the release branch {} already exists, so presuming this step already ran.",
                identity.release_branch
            );
        } else {
            working
                .checkout_remote_branch(&identity.candidate_branch)
                .await?;
            working.force_push(&identity.release_branch).await?;
            working.fetch().await?;
        }

        working
            .checkout_remote_branch(&identity.release_branch)
            .await?;
        let finalized = self.finalize(strategy, repo, &working).await?;
        Ok(ReleaseOutcome::Released(finalized))
    }

    async fn release_pull_request(
        &self,
        strategy: &RepoStrategy,
        repo: &RepositoryHandle,
        url: &str,
    ) -> Result<ReleaseOutcome> {
        let identity = self.identity;
        let hosting = &self.deps.hosting;

        // 1. The PR must belong to the repository being released
        let pull_request = parse_pull_request_url(url)?;
        if pull_request.repository != identity.repository {
            return Err(ValidationError::RepositoryMismatch {
                expected: identity.repository.clone(),
                found: pull_request.repository,
            }
            .into());
        }
        let number = pull_request.number;
        strategy.validate_release(identity)?;

        let working = self.deps.cloner.clone_or_open(&identity.remote_url()).await?;

        // 2. Already merged by an earlier run: re-run the tail, which reuses
        //    whatever the earlier run already published
        if hosting.merge_state(repo, number).await? == MergeState::AlreadyMerged {
            info!(
                "Candidate branch has already merged into release branch. No merge operation will be attempted."
            );
            working.fetch().await?;
            working
                .checkout_remote_branch(&identity.release_branch)
                .await?;
            let finalized = self.finalize(strategy, repo, &working).await?;
            return Ok(ReleaseOutcome::AlreadyMerged(finalized));
        }

        // 3. Last-minute edits on the candidate (GDK only)
        if !strategy.release_edits.is_empty() {
            self.update_candidate(strategy, &*working).await?;
        }

        // 4. Wait for checks and reviews, then merge
        let deadline = self.deps.policy.start();
        match self.wait_until_mergeable(repo, number, url, &deadline).await? {
            Readiness::Ready => self.merge_with_retry(repo, number, url, &deadline).await?,
            Readiness::MergedElsewhere => {
                info!("{} was merged while waiting, skipping merge", url)
            }
        }
        info!("{} had been merged.", url);

        // 5. Draft the release from the merged release branch
        working.fetch().await?;
        working
            .checkout_remote_branch(&identity.release_branch)
            .await?;
        let finalized = self.finalize(strategy, repo, &working).await?;
        Ok(ReleaseOutcome::Released(finalized))
    }

    /// Re-apply release edits to the candidate and push them. A candidate
    /// that already carries them is left alone.
    async fn update_candidate<G: GitOperations>(
        &self,
        strategy: &RepoStrategy,
        git: &G,
    ) -> Result<()> {
        let identity = self.identity;
        git.checkout_remote_branch(&identity.candidate_branch).await?;

        let mut engine_commits = Vec::new();
        if strategy.needs_engine_commits() {
            for engine_version in &identity.engine_versions {
                engine_commits.push(self.deps.metadata.get_metadata(engine_version).await?);
            }
        }

        let changed = strategy.apply_release_edits(
            git.path(),
            identity,
            self.deps.today,
            &engine_commits,
        )?;
        stage_all(git, &changed).await?;

        let message = format!("Update branch for GDK for Unreal {}.", identity.version);
        match git.commit(&message).await {
            Ok(()) => git.force_push(&identity.candidate_branch).await,
            Err(ReleaseError::Git(GitError::NothingToCommit)) => {
                info!(
                    "Candidate branch {} is already up to date for the release",
                    identity.candidate_branch
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Poll merge state every interval until the PR is ready or the
    /// deadline passes
    async fn wait_until_mergeable(
        &self,
        repo: &RepositoryHandle,
        number: u64,
        url: &str,
        deadline: &Deadline,
    ) -> Result<Readiness> {
        loop {
            deadline.check(url)?;

            match self.deps.hosting.merge_state(repo, number).await? {
                MergeState::ReadyToMerge => {
                    info!("{} is mergeable. Attempting to merge.", url);
                    return Ok(Readiness::Ready);
                }
                MergeState::AlreadyMerged => return Ok(Readiness::MergedElsewhere),
                state => info!(
                    "{} is not in a mergeable state ({}), will query mergeability again in {:?}.",
                    url, state, self.deps.policy.poll_interval
                ),
            }

            tokio::time::sleep(self.deps.policy.poll_interval).await;
        }
    }

    /// Merge, retrying `NotMergeable` rejections until the deadline
    async fn merge_with_retry(
        &self,
        repo: &RepositoryHandle,
        number: u64,
        url: &str,
        deadline: &Deadline,
    ) -> Result<()> {
        let message = format!(
            "Merging final GDK for Unreal {} release",
            self.identity.version
        );

        loop {
            match self
                .deps
                .hosting
                .merge(repo, number, MergeMethod::Merge, &message)
                .await
            {
                Ok(result) => {
                    if let Some(sha) = result.sha {
                        info!("Merge commit: {}", sha);
                    }
                    return Ok(());
                }
                Err(e) if e.is_transient() => {
                    info!("Was unable to merge pull request at: {}. Received error: {}", url, e);
                }
                Err(e) => return Err(e),
            }

            deadline.check(url)?;
            info!(
                "{} is not in a mergeable state, will attempt the merge again in {:?}.",
                url, self.deps.policy.poll_interval
            );
            tokio::time::sleep(self.deps.policy.poll_interval).await;
        }
    }

    /// Publish the release commit, draft the release unless one with the
    /// same tag exists, annotate, then open the cleanup PR. `working` must
    /// have the release branch checked out.
    async fn finalize(
        &self,
        strategy: &RepoStrategy,
        repo: &RepositoryHandle,
        working: &WorkingCopy<C::Repo>,
    ) -> Result<FinalizedRelease> {
        let identity = self.identity;
        let head = working.head_commit_sha().await?;

        self.deps
            .metadata
            .set_metadata(&identity.release_branch, &head)
            .await?;

        let notes = if strategy.uses_changelog_notes() {
            read_release_notes(working.path())?
        } else {
            String::new()
        };
        let draft = strategy.release_draft(&self.deps.templates, identity, &head, &notes)?;

        let existing = self.deps.hosting.find_release_by_tag(repo, &draft.tag).await?;
        let release_existed = existing.is_some();
        let release = match existing {
            Some(release) => {
                info!(
                    "A release tagged {} already exists: {}",
                    draft.tag, release.html_url
                );
                release
            }
            None => {
                let release = self.deps.hosting.create_draft_release(repo, &draft).await?;
                let annotation = format!(
                    "* Successfully created a [draft release]({}) in the repo `{}`. \
                     Your human labour is now required to publish it.\n",
                    release.html_url, identity.repository
                );
                self.deps
                    .metadata
                    .annotate(AnnotationLevel::Info, DRAFT_RELEASES_CONTEXT, &annotation, true)
                    .await?;
                release
            }
        };

        info!("Release Successful!");
        info!("Release hash: {}", head);
        info!("Draft release: {}", release.html_url);

        let cleanup = self.open_cleanup_pull_request(repo, working).await?;
        Ok(FinalizedRelease {
            release,
            release_existed,
            cleanup,
        })
    }

    /// Open (or find) the PR carrying the release branch back into the source
    /// branch. `Ok(None)` when the two branches do not differ.
    async fn open_cleanup_pull_request(
        &self,
        repo: &RepositoryHandle,
        working: &WorkingCopy<C::Repo>,
    ) -> Result<Option<PullRequestRecord>> {
        let identity = self.identity;
        let hosting = &self.deps.hosting;
        let cleanup_branch = identity.cleanup_branch();

        let existing = hosting
            .find_pull_request(
                repo,
                &identity.organization,
                &cleanup_branch,
                &identity.source_branch,
            )
            .await?;

        let pull_request = match existing {
            Some(pull_request) => {
                info!(
                    "A PR has already been opened from release branch into source branch: {}",
                    pull_request.html_url
                );
                pull_request
            }
            None => {
                working
                    .checkout_remote_branch(&identity.release_branch)
                    .await?;
                working.force_push(&cleanup_branch).await?;

                let created = hosting
                    .create_pull_request(
                        repo,
                        &cleanup_branch,
                        &identity.source_branch,
                        &format!(
                            "Release {} - Merge {} into {}",
                            identity.version, identity.release_branch, identity.source_branch
                        ),
                        &format!(
                            "Merging {} back into {}. Please manually resolve merge conflicts.",
                            identity.release_branch, identity.source_branch
                        ),
                    )
                    .await;

                match created {
                    Ok(pull_request) => pull_request,
                    Err(ReleaseError::GitHub(GitHubError::NoCommitsBetween { message })) => {
                        info!("{}", message);
                        info!("No PR will be created.");
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let annotation = format!(
            "* Successfully created a [pull request]({}) in the repo `{}` from `{}` into `{}`. \
             Your human labour is now required to merge these PRs.\n",
            pull_request.html_url,
            identity.repository,
            identity.release_branch,
            identity.source_branch
        );
        self.deps
            .metadata
            .annotate(AnnotationLevel::Info, CLEANUP_PRS_CONTEXT, &annotation, true)
            .await?;

        info!("Pull request available: {}", pull_request.html_url);
        info!(
            "Successfully created PR for merging {} into {}.",
            identity.release_branch, identity.source_branch
        );
        Ok(Some(pull_request))
    }
}
