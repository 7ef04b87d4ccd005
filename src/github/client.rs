//! GitHub client built on octocrab.

use crate::error::{GitHubError, Result};
use crate::github::{
    DraftRelease, HostingClient, MergeMethod, MergeResult, MergeState, PullRequestRecord,
    ReleaseDraft, RepositoryHandle,
};
use log::{debug, info};
use octocrab::Octocrab;
use octocrab::models::pulls::{MergeableState, PullRequest};
use octocrab::params;
use std::sync::OnceLock;

/// HTTP status GitHub returns when a PR cannot be merged yet
const METHOD_NOT_ALLOWED: u16 = 405;

/// HTTP status GitHub returns for rejected input
const UNPROCESSABLE_ENTITY: u16 = 422;

/// One-time initialization guard for the rustls crypto provider
static RUSTLS_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Hosting client for one GitHub account
pub struct OctocrabClient {
    octocrab: Octocrab,
}

impl OctocrabClient {
    /// Create a client authenticated with a personal or app token
    pub fn with_token(token: &str) -> Result<Self> {
        RUSTLS_INITIALIZED.get_or_init(|| {
            // Fails only if a provider is already installed, which is fine.
            let _ = rustls::crypto::ring::default_provider().install_default();
        });

        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| GitHubError::Api {
                operation: "client_init".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { octocrab })
    }

    fn to_record(pr: PullRequest) -> PullRequestRecord {
        let merge_state = merge_state_of(&pr);
        PullRequestRecord {
            id: pr.number,
            head_branch: pr.head.ref_field.clone(),
            base_branch: pr.base.ref_field.clone(),
            html_url: pr.html_url.map(|u| u.to_string()).unwrap_or_default(),
            merge_state,
        }
    }
}

/// Classify a PR's merge readiness
fn merge_state_of(pr: &PullRequest) -> MergeState {
    classify_merge_state(
        pr.merged_at.is_some(),
        pr.mergeable,
        pr.mergeable_state.as_ref(),
    )
}

/// `unstable` (optional checks failing) and `has_hooks` still merge under
/// branch protection, so both count as ready alongside `clean`.
fn classify_merge_state(
    merged: bool,
    mergeable: Option<bool>,
    mergeable_state: Option<&MergeableState>,
) -> MergeState {
    if merged {
        return MergeState::AlreadyMerged;
    }

    match mergeable {
        None => MergeState::Unknown,
        Some(true)
            if matches!(
                mergeable_state,
                Some(MergeableState::Clean | MergeableState::Unstable | MergeableState::HasHooks)
            ) =>
        {
            MergeState::ReadyToMerge
        }
        Some(_) => MergeState::Blocked,
    }
}

/// Status code and flattened messages of an API error response
fn api_failure(error: &octocrab::Error) -> Option<(u16, String)> {
    match error {
        octocrab::Error::GitHub { source, .. } => {
            let mut detail = source.message.clone();
            if let Some(errors) = &source.errors {
                for entry in errors {
                    detail.push(' ');
                    detail.push_str(&entry.to_string());
                }
            }
            Some((source.status_code.as_u16(), detail))
        }
        _ => None,
    }
}

fn api_error(operation: &str, error: octocrab::Error) -> GitHubError {
    GitHubError::Api {
        operation: operation.to_string(),
        reason: error.to_string(),
    }
}

/// Parse GitHub owner/repo from a remote URL
///
/// Supports Git URL formats:
/// - SSH SCP-like: git@github.com:owner/repo.git
/// - HTTPS: https://github.com/owner/repo(.git)
pub fn parse_github_url(url: &str) -> Result<(String, String)> {
    let invalid = || GitHubError::InvalidRepositoryUrl {
        url: url.to_string(),
    };

    let path = if let Some(rest) = url.strip_prefix("git@github.com:") {
        rest
    } else if let Some(start) = url.find("github.com/") {
        &url[start + "github.com/".len()..]
    } else {
        return Err(invalid().into());
    };

    let path = path.trim_end_matches('/').trim_end_matches(".git");
    let mut parts = path.split('/');
    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(invalid().into()),
    }
}

impl HostingClient for OctocrabClient {
    async fn repository_from_url(&self, url: &str) -> Result<RepositoryHandle> {
        let (owner, name) = parse_github_url(url)?;
        debug!("Resolving repository {}/{}", owner, name);

        let repo = self
            .octocrab
            .repos(&owner, &name)
            .get()
            .await
            .map_err(|e| api_error("get_repository", e))?;

        Ok(RepositoryHandle {
            owner: repo.owner.map(|o| o.login).unwrap_or(owner),
            name: repo.name,
            clone_url: repo
                .clone_url
                .map(|u| u.to_string())
                .unwrap_or_else(|| format!("{}.git", url.trim_end_matches(".git"))),
        })
    }

    async fn find_pull_request(
        &self,
        repo: &RepositoryHandle,
        org: &str,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequestRecord>> {
        let page = self
            .octocrab
            .pulls(&repo.owner, &repo.name)
            .list()
            .state(params::State::Open)
            .head(format!("{}:{}", org, head))
            .base(base)
            .send()
            .await
            .map_err(|e| api_error("list_pull_requests", e))?;

        Ok(page.items.into_iter().next().map(Self::to_record))
    }

    async fn create_pull_request(
        &self,
        repo: &RepositoryHandle,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequestRecord> {
        info!("Creating PR: {} ({} -> {})", title, head, base);

        let created = self
            .octocrab
            .pulls(&repo.owner, &repo.name)
            .create(title, head, base)
            .body(body)
            .send()
            .await;

        match created {
            Ok(pr) => Ok(Self::to_record(pr)),
            Err(e) => match api_failure(&e) {
                Some((UNPROCESSABLE_ENTITY, detail)) if detail.contains("No commits between") => {
                    Err(GitHubError::NoCommitsBetween { message: detail }.into())
                }
                _ => Err(api_error("create_pull_request", e).into()),
            },
        }
    }

    async fn merge_state(&self, repo: &RepositoryHandle, pull_request: u64) -> Result<MergeState> {
        let pr = self
            .octocrab
            .pulls(&repo.owner, &repo.name)
            .get(pull_request)
            .await
            .map_err(|e| api_error("get_pull_request", e))?;

        let state = merge_state_of(&pr);
        debug!("PR #{} merge state: {}", pull_request, state);
        Ok(state)
    }

    async fn merge(
        &self,
        repo: &RepositoryHandle,
        pull_request: u64,
        method: MergeMethod,
        commit_message: &str,
    ) -> Result<MergeResult> {
        let method = match method {
            MergeMethod::Merge => params::pulls::MergeMethod::Merge,
            MergeMethod::Squash => params::pulls::MergeMethod::Squash,
            MergeMethod::Rebase => params::pulls::MergeMethod::Rebase,
        };

        let merged = self
            .octocrab
            .pulls(&repo.owner, &repo.name)
            .merge(pull_request)
            .method(method)
            .message(commit_message)
            .send()
            .await;

        match merged {
            Ok(result) if result.merged => Ok(MergeResult {
                merged: true,
                sha: result.sha,
            }),
            Ok(result) => Err(GitHubError::NotMergeable {
                pull_request,
                reason: result
                    .message
                    .unwrap_or_else(|| "merge was not performed".to_string()),
            }
            .into()),
            Err(e) => match api_failure(&e) {
                Some((METHOD_NOT_ALLOWED, detail)) => Err(GitHubError::NotMergeable {
                    pull_request,
                    reason: detail,
                }
                .into()),
                _ => Err(api_error("merge_pull_request", e).into()),
            },
        }
    }

    async fn find_release_by_tag(
        &self,
        repo: &RepositoryHandle,
        tag: &str,
    ) -> Result<Option<DraftRelease>> {
        // Tag lookup skips drafts, so scan the listing instead
        let first_page = self
            .octocrab
            .repos(&repo.owner, &repo.name)
            .releases()
            .list()
            .per_page(100)
            .send()
            .await
            .map_err(|e| api_error("list_releases", e))?;
        let releases = self
            .octocrab
            .all_pages(first_page)
            .await
            .map_err(|e| api_error("list_releases", e))?;

        Ok(releases
            .into_iter()
            .find(|release| release.tag_name == tag)
            .map(|release| DraftRelease {
                id: release.id.0,
                html_url: release.html_url.to_string(),
            }))
    }

    async fn create_draft_release(
        &self,
        repo: &RepositoryHandle,
        draft: &ReleaseDraft,
    ) -> Result<DraftRelease> {
        info!("Creating draft release {} in {}/{}", draft.tag, repo.owner, repo.name);

        let release = self
            .octocrab
            .repos(&repo.owner, &repo.name)
            .releases()
            .create(&draft.tag)
            .target_commitish(&draft.target_commit)
            .name(&draft.name)
            .body(&draft.body)
            .draft(true)
            .prerelease(false)
            .send()
            .await
            .map_err(|e| api_error("create_release", e))?;

        Ok(DraftRelease {
            id: release.id.0,
            html_url: release.html_url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_and_ssh_urls() {
        assert_eq!(
            parse_github_url("https://github.com/spatialos/UnrealGDK").unwrap(),
            ("spatialos".to_string(), "UnrealGDK".to_string())
        );
        assert_eq!(
            parse_github_url("https://github.com/spatialos/UnrealGDK.git").unwrap(),
            ("spatialos".to_string(), "UnrealGDK".to_string())
        );
        assert_eq!(
            parse_github_url("git@github.com:improbableio/UnrealEngine.git").unwrap(),
            ("improbableio".to_string(), "UnrealEngine".to_string())
        );
    }

    #[test]
    fn rejects_non_github_urls() {
        assert!(parse_github_url("https://gitlab.com/o/r").is_err());
        assert!(parse_github_url("https://github.com/only-owner").is_err());
    }

    #[test]
    fn merge_readiness_follows_mergeable_state() {
        use MergeableState::*;

        assert_eq!(classify_merge_state(true, Some(false), Some(&Dirty)), MergeState::AlreadyMerged);
        assert_eq!(classify_merge_state(false, None, None), MergeState::Unknown);
        for ready in [Clean, Unstable, HasHooks] {
            assert_eq!(
                classify_merge_state(false, Some(true), Some(&ready)),
                MergeState::ReadyToMerge
            );
        }
        for held in [Blocked, Behind, Dirty, Draft, Unknown] {
            assert_eq!(
                classify_merge_state(false, Some(true), Some(&held)),
                MergeState::Blocked
            );
        }
        assert_eq!(classify_merge_state(false, Some(false), Some(&Clean)), MergeState::Blocked);
        assert_eq!(classify_merge_state(false, Some(true), None), MergeState::Blocked);
    }
}
