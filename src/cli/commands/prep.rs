//! `prep` subcommand.

use super::helpers::{build_collaborators, build_identity};
use crate::cli::ReleaseArgs;
use crate::error::Result;
use crate::orchestrator::{PrepOrchestrator, PrepOutcome};
use log::info;

/// Cut the candidate branch and open its PR
pub(super) async fn execute_prep(args: &ReleaseArgs) -> Result<()> {
    let identity = build_identity(args)?;
    let deps = build_collaborators(args)?;

    info!(
        "Prepping {} {} from {}",
        identity.repository, identity.version, identity.source_branch
    );

    match PrepOrchestrator::new(&identity, &deps).run().await? {
        PrepOutcome::NoReleaseBranch => info!(
            "Candidate {} is ready; the release will create {} directly",
            identity.candidate_branch, identity.release_branch
        ),
        PrepOutcome::PullRequest(pull_request) => info!(
            "Successfully created pull request for the release: {}",
            pull_request.html_url
        ),
    }

    Ok(())
}
