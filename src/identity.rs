//! Release identity and the naming conventions derived from it.
//!
//! A [`ReleaseIdentity`] is built once per invocation from operator input and
//! never mutated. Branch names, remote URLs and metadata keys are all derived
//! from it so every stage of a pipeline agrees on them.

use crate::error::{Result, ValidationError};
use regex::Regex;
use std::sync::LazyLock;

/// Template for the remote URL of a repository
pub const REPO_URL_PREFIX: &str = "https://github.com";

/// Immutable description of the release being cut in one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseIdentity {
    /// Validated release version, e.g. `0.12.0` or `0.12.0-preview`
    pub version: String,
    /// Development branch the candidate is cut from
    pub source_branch: String,
    /// Branch holding release-specific edits pending review
    pub candidate_branch: String,
    /// Stable branch the candidate is merged into
    pub release_branch: String,
    /// Repository name, e.g. `UnrealGDK`
    pub repository: String,
    /// GitHub organization owning the repository
    pub organization: String,
    /// Engine source branches released alongside this repository
    pub engine_versions: Vec<String>,
}

impl ReleaseIdentity {
    /// Validate the version and build the identity
    pub fn new(
        version: impl Into<String>,
        source_branch: impl Into<String>,
        candidate_branch: impl Into<String>,
        release_branch: impl Into<String>,
        repository: impl Into<String>,
        organization: impl Into<String>,
    ) -> Result<Self> {
        let version = version.into();
        verify_semantic_version(&version)?;

        Ok(Self {
            version,
            source_branch: source_branch.into(),
            candidate_branch: candidate_branch.into(),
            release_branch: release_branch.into(),
            repository: repository.into(),
            organization: organization.into(),
            engine_versions: Vec::new(),
        })
    }

    /// Attach the engine versions from a space separated list
    pub fn with_engine_versions(mut self, engine_versions: Option<&str>) -> Self {
        self.engine_versions = parse_engine_versions(engine_versions.unwrap_or_default());
        self
    }

    /// `https://github.com/<org>/<repo>`
    pub fn remote_url(&self) -> String {
        repo_url(&self.organization, &self.repository)
    }

    /// Browser link to a branch of this repository
    pub fn tree_url(&self, branch: &str) -> String {
        format!("{}/tree/{}", self.remote_url(), branch)
    }

    /// Branch used to carry the release branch back into the source branch
    pub fn cleanup_branch(&self) -> String {
        format!("{}-cleanup", self.candidate_branch)
    }

    /// Version string with the release candidate suffix
    pub fn candidate_version(&self) -> String {
        format!("{}-rc", self.version)
    }
}

/// Build the remote URL of a repository
pub fn repo_url(organization: &str, repository: &str) -> String {
    format!("{}/{}/{}", REPO_URL_PREFIX, organization, repository)
}

/// Verify `version` is `MAJOR.MINOR.PATCH` with an optional pre-release suffix.
pub fn verify_semantic_version(version: &str) -> Result<semver::Version> {
    let parsed = semver::Version::parse(version).map_err(|e| ValidationError::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })?;

    if !parsed.build.is_empty() {
        return Err(ValidationError::InvalidVersion {
            version: version.to_string(),
            reason: "build metadata is not allowed".to_string(),
        }
        .into());
    }

    Ok(parsed)
}

/// Split the `--engine-versions` value into trimmed, unquoted entries
pub fn parse_engine_versions(raw: &str) -> Vec<String> {
    raw.replace('"', "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Reference to a pull request parsed from its browser URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    /// Owner (organization) of the repository
    pub owner: String,
    /// Repository name
    pub repository: String,
    /// Pull request number
    pub number: u64,
}

static PULL_REQUEST_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/(?P<owner>[^/\s]+)/(?P<repo>[^/\s]+)/pull/(?P<number>\d+)/?$")
        .expect("pull request URL regex is valid")
});

/// Normalize a `--pull-request-url` value. Quotes and whitespace are stripped;
/// an empty result means no PR was supplied.
pub fn normalize_pull_request_url(raw: Option<&str>) -> Option<String> {
    let cleaned = raw?.replace('"', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Parse `https://github.com/<owner>/<repo>/pull/<n>`
pub fn parse_pull_request_url(url: &str) -> Result<PullRequestRef> {
    let invalid = || ValidationError::InvalidPullRequestUrl {
        url: url.to_string(),
    };

    let caps = PULL_REQUEST_URL_RE.captures(url.trim()).ok_or_else(invalid)?;
    let number = caps["number"].parse::<u64>().map_err(|_| invalid())?;

    Ok(PullRequestRef {
        owner: caps["owner"].to_string(),
        repository: caps["repo"].to_string(),
        number,
    })
}
