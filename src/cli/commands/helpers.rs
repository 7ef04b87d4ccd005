//! Collaborator wiring shared by the subcommands.

use crate::cli::ReleaseArgs;
use crate::error::{GitHubError, Result, ValidationError};
use crate::git::SystemGitCloner;
use crate::github::OctocrabClient;
use crate::identity::ReleaseIdentity;
use crate::metadata::{AnnotationLevel, BuildkiteAgentStore, FileMetadataStore, MetadataStore};
use crate::orchestrator::{Collaborators, MergePolicy};
use log::debug;

/// Metadata backend selected on the command line
pub(super) enum MetadataBackend {
    /// `buildkite-agent` CLI of the running job
    Buildkite(BuildkiteAgentStore),
    /// Local JSON file (`--metadata-file`)
    File(FileMetadataStore),
}

impl MetadataStore for MetadataBackend {
    async fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        match self {
            MetadataBackend::Buildkite(store) => store.set_metadata(key, value).await,
            MetadataBackend::File(store) => store.set_metadata(key, value).await,
        }
    }

    async fn get_metadata(&self, key: &str) -> Result<String> {
        match self {
            MetadataBackend::Buildkite(store) => store.get_metadata(key).await,
            MetadataBackend::File(store) => store.get_metadata(key).await,
        }
    }

    async fn annotate(
        &self,
        level: AnnotationLevel,
        context: &str,
        body: &str,
        append: bool,
    ) -> Result<()> {
        match self {
            MetadataBackend::Buildkite(store) => store.annotate(level, context, body, append).await,
            MetadataBackend::File(store) => store.annotate(level, context, body, append).await,
        }
    }
}

/// Collaborators for a real run
pub(super) type LiveCollaborators = Collaborators<SystemGitCloner, OctocrabClient, MetadataBackend>;

/// Validate the version and build the release identity
pub(super) fn build_identity(args: &ReleaseArgs) -> Result<ReleaseIdentity> {
    for (argument, value) in [
        ("--source-branch", &args.source_branch),
        ("--candidate-branch", &args.candidate_branch),
        ("--release-branch", &args.release_branch),
        ("--git-repository-name", &args.git_repository_name),
        ("--github-organization", &args.github_organization),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingArgument {
                argument: argument.to_string(),
            }
            .into());
        }
    }

    Ok(ReleaseIdentity::new(
        args.version.trim(),
        args.source_branch.trim(),
        args.candidate_branch.trim(),
        args.release_branch.trim(),
        args.git_repository_name.trim(),
        args.github_organization.trim(),
    )?
    .with_engine_versions(args.engine_versions.as_deref()))
}

/// Token from `--github-token`, `--github-token-file`, `GITHUB_TOKEN` or
/// `GH_TOKEN`, in that order
pub(super) fn resolve_token(args: &ReleaseArgs) -> Result<String> {
    if let Some(token) = args.github_token.as_deref().map(str::trim)
        && !token.is_empty()
    {
        return Ok(token.to_string());
    }

    if let Some(path) = &args.github_token_file {
        debug!("Reading GitHub token from {}", path.display());
        let token = std::fs::read_to_string(path)?.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    ["GITHUB_TOKEN", "GH_TOKEN"]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
        .ok_or_else(|| GitHubError::MissingToken.into())
}

/// Wire the git, GitHub and metadata backends for one run
pub(super) fn build_collaborators(args: &ReleaseArgs) -> Result<LiveCollaborators> {
    let token = resolve_token(args)?;

    let work_dir = args
        .work_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let cloner = SystemGitCloner::new(work_dir, Some(token.clone()))
        .keep_checkouts(args.keep_checkouts);

    let hosting = OctocrabClient::with_token(&token)?;

    let metadata = match &args.metadata_file {
        Some(path) => MetadataBackend::File(FileMetadataStore::new(path)),
        None => MetadataBackend::Buildkite(BuildkiteAgentStore::default()),
    };

    Ok(Collaborators::new(cloner, hosting, metadata)?.with_policy(MergePolicy::from_env()))
}
