//! Error types for release orchestration.
//!
//! Every failure a run can hit is classified here so the command layer can
//! decide between retrying, reporting, and exiting non-zero.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for release_tool operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release_tool operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Operator input was malformed or inconsistent
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Git operation errors
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// GitHub operation errors
    #[error("GitHub error: {0}")]
    GitHub(#[from] GitHubError),

    /// Pipeline metadata errors
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Repository file transformation errors
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// A bounded wait ran past its deadline
    #[error("Timed out after {elapsed:?} waiting for {waiting_for}")]
    Timeout {
        /// What the run was waiting on
        waiting_for: String,
        /// Time spent before giving up
        elapsed: Duration,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Template rendering errors
    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// Template registration errors
    #[error("Template syntax error: {0}")]
    TemplateSyntax(#[from] handlebars::TemplateError),
}

/// Operator input errors. Never retried.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Version string is not MAJOR.MINOR.PATCH[-pre]
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion {
        /// Version string
        version: String,
        /// Reason for the error
        reason: String,
    },

    /// The PR URL points at a different repository than the one being released
    #[error(
        "Repository names given do not match. Repository name given: {expected}, PR URL repository name: {found}"
    )]
    RepositoryMismatch {
        /// Repository named on the command line
        expected: String,
        /// Repository named by the PR URL
        found: String,
    },

    /// PR URL could not be parsed
    #[error("Invalid pull request URL '{url}'")]
    InvalidPullRequestUrl {
        /// The rejected URL
        url: String,
    },

    /// Required input missing
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },
}

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Remote branch does not exist
    #[error("Branch '{branch}' not found on origin")]
    BranchNotFound {
        /// Branch name
        branch: String,
    },

    /// Commit requested on a clean tree
    #[error("Nothing to commit, working tree clean")]
    NothingToCommit,

    /// Working copy could not be opened
    #[error("Not a git repository: {path}")]
    NotRepository {
        /// Path that was expected to be a repository
        path: PathBuf,
    },

    /// A git command exited unsuccessfully
    #[error("git {command} failed: {stderr}")]
    CommandFailed {
        /// Arguments passed to git
        command: String,
        /// Captured stderr
        stderr: String,
    },

    /// Reading repository state through gix failed
    #[error("Failed to read repository state: {reason}")]
    ReadFailed {
        /// Reason for the error
        reason: String,
    },
}

/// GitHub API errors
#[derive(Error, Debug)]
pub enum GitHubError {
    /// The remote refused to merge; expected while checks are pending
    #[error("Pull request #{pull_request} is not mergeable: {reason}")]
    NotMergeable {
        /// Pull request number
        pull_request: u64,
        /// Message returned by the API
        reason: String,
    },

    /// GitHub refused to open a PR because head and base are identical
    #[error("{message}")]
    NoCommitsBetween {
        /// Message returned by the API
        message: String,
    },

    /// Could not derive owner/repo from a URL
    #[error("Could not parse GitHub owner/repo from URL: '{url}'")]
    InvalidRepositoryUrl {
        /// The rejected URL
        url: String,
    },

    /// No token was configured
    #[error(
        "GitHub token not provided. Use --github-token, --github-token-file, or set GITHUB_TOKEN"
    )]
    MissingToken,

    /// Any other API failure
    #[error("GitHub API call '{operation}' failed: {reason}")]
    Api {
        /// Operation that failed
        operation: String,
        /// Reason for the error
        reason: String,
    },
}

/// Pipeline metadata store errors
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Key was read before any stage wrote it
    #[error("Metadata key '{key}' not found")]
    KeyNotFound {
        /// Missing key
        key: String,
    },

    /// The agent CLI returned a failure
    #[error("buildkite-agent {command} failed: {reason}")]
    AgentFailed {
        /// Sub-command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// Metadata file could not be persisted
    #[error("Failed to save metadata file {path}: {reason}")]
    SaveFailed {
        /// File path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// File transformation errors
#[derive(Error, Debug)]
pub enum TransformError {
    /// No strategy table entry for this repository
    #[error("Unsupported repository '{repository}': no prep edits or templates are defined")]
    UnsupportedRepository {
        /// Repository name
        repository: String,
    },

    /// A file the strategy edits is absent
    #[error("Could not update '{path}' as the file does not exist")]
    MissingFile {
        /// Relative path
        path: PathBuf,
    },

    /// A file's content did not have the expected structure
    #[error("Could not update '{path}': {reason}")]
    InvalidContent {
        /// Relative path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Whether this error is expected to clear up on its own with time
    pub fn is_transient(&self) -> bool {
        matches!(self, ReleaseError::GitHub(GitHubError::NotMergeable { .. }))
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Validation(ValidationError::InvalidVersion { .. }) => vec![
                "Use a semantic version such as 1.2.3 or 1.2.3-preview".to_string(),
            ],
            ReleaseError::Validation(ValidationError::RepositoryMismatch { .. }) => vec![
                "Pass the pull request URL that belongs to --git-repository-name".to_string(),
            ],
            ReleaseError::GitHub(GitHubError::MissingToken) => vec![
                "Export GITHUB_TOKEN or pass --github-token-file".to_string(),
            ],
            ReleaseError::Metadata(MetadataError::KeyNotFound { key }) => vec![
                format!("Ensure the pipeline stage that writes '{}' ran first", key),
            ],
            ReleaseError::Transform(TransformError::UnsupportedRepository { .. }) => vec![
                "Add an entry for the repository to the transform strategy table".to_string(),
            ],
            ReleaseError::Timeout { .. } => vec![
                "Check the pull request for failing checks or missing reviews".to_string(),
                "Re-run the same command; completed steps are skipped".to_string(),
            ],
            _ => vec!["Re-run the same command; completed steps are skipped".to_string()],
        }
    }
}
