//! `release` subcommand.

use super::helpers::{build_collaborators, build_identity};
use crate::cli::ReleaseArgs;
use crate::error::Result;
use crate::orchestrator::{ReleaseOrchestrator, ReleaseOutcome};
use log::info;

/// Merge the candidate and draft the release
pub(super) async fn execute_release(args: &ReleaseArgs, pull_request_url: &str) -> Result<()> {
    let identity = build_identity(args)?;
    let deps = build_collaborators(args)?;

    info!(
        "Releasing {} {} into {}",
        identity.repository, identity.version, identity.release_branch
    );

    let outcome = ReleaseOrchestrator::new(&identity, &deps)
        .run(Some(pull_request_url))
        .await?;

    let finalized = match outcome {
        ReleaseOutcome::AlreadyMerged(finalized) => {
            info!("Pull request was merged by an earlier run");
            finalized
        }
        ReleaseOutcome::Released(finalized) => finalized,
    };
    info!("Draft release: {}", finalized.release.html_url);

    match finalized.cleanup {
        Some(pull_request) => info!("Cleanup pull request: {}", pull_request.html_url),
        None => info!(
            "{} has no commits to merge back into {}",
            identity.release_branch, identity.source_branch
        ),
    }

    Ok(())
}
