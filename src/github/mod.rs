//! GitHub integration for release operations

mod client;
mod operations;
mod types;

pub use client::OctocrabClient;
pub use operations::HostingClient;
pub use types::{
    DraftRelease, MergeMethod, MergeResult, MergeState, PullRequestRecord, ReleaseDraft,
    RepositoryHandle,
};
