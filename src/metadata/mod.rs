//! Pipeline metadata shared between independently invoked runs.
//!
//! The store is the only channel through which prep and release runs for
//! different repositories exchange data. Keys are write-once in practice:
//! each is written by exactly one stage of the pipeline.

mod buildkite;
mod file_store;

pub use buildkite::BuildkiteAgentStore;
pub use file_store::{Annotation, FileMetadataStore, MetadataDocument};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Annotation context for candidate-into-release PR links
pub const CANDIDATE_PRS_CONTEXT: &str = "candidate-into-release-prs";

/// Annotation context for draft release links
pub const DRAFT_RELEASES_CONTEXT: &str = "draft-releases";

/// Annotation context for release-into-source PR links
pub const CLEANUP_PRS_CONTEXT: &str = "release-into-source-prs";

/// Key holding the source branch the GDK candidate was cut from
pub const GDK_SOURCE_BRANCH_KEY: &str = "gdk-source-branch";

/// Key under which a repository publishes its candidate PR URL
pub fn pr_url_key(repository: &str, source_branch: &str) -> String {
    format!("{}-{}-pr-url", repository, source_branch)
}

/// Severity of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    /// Informational
    Info,
    /// Something completed
    Success,
    /// Needs attention
    Warning,
    /// Something failed
    Error,
}

impl AnnotationLevel {
    /// Style name understood by the Buildkite agent
    pub fn as_style(&self) -> &'static str {
        match self {
            AnnotationLevel::Info => "info",
            AnnotationLevel::Success => "success",
            AnnotationLevel::Warning => "warning",
            AnnotationLevel::Error => "error",
        }
    }
}

/// Shared key/value store plus human-readable annotations
pub trait MetadataStore {
    /// Write `value` under `key` (last write wins)
    fn set_metadata(&self, key: &str, value: &str) -> impl Future<Output = Result<()>>;

    /// Read `key`. Fails with `KeyNotFound` if no stage has written it.
    fn get_metadata(&self, key: &str) -> impl Future<Output = Result<String>>;

    /// Publish a markdown annotation under `context`, appending to or
    /// replacing what is already there
    fn annotate(
        &self,
        level: AnnotationLevel,
        context: &str,
        body: &str,
        append: bool,
    ) -> impl Future<Output = Result<()>>;
}
