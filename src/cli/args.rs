//! Command line argument parsing.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Release orchestration for the GDK repository family
#[derive(Parser, Debug)]
#[command(
    name = "release_tool",
    version,
    about = "Cut release candidates and finalize releases across GitHub repositories",
    long_about = "Cut release candidates and finalize releases across GitHub repositories.

Every step is fenced by an existence check, so a failed or interrupted run can
be repeated with the same arguments.

Usage:
  release_tool prep 0.12.0 --source-branch master --candidate-branch 0.12.0-rc \\
      --release-branch release --git-repository-name UnrealGDK --github-organization spatialos
  release_tool release 0.12.0 --pull-request-url https://github.com/spatialos/UnrealGDK/pull/1 ..."
)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Prep a release candidate branch
    Prep {
        /// Shared release options
        #[command(flatten)]
        release: ReleaseArgs,
    },

    /// Merge a release branch and create a GitHub release draft
    Release {
        /// The link to the release candidate PR to merge. Blank releases
        /// straight from the candidate branch.
        #[arg(short = 'u', long, default_value = "")]
        pull_request_url: String,

        /// Shared release options
        #[command(flatten)]
        release: ReleaseArgs,
    },
}

impl Command {
    /// Subcommand name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Prep { .. } => "prep",
            Command::Release { .. } => "release",
        }
    }

    /// Options shared by both subcommands
    pub fn release_args(&self) -> &ReleaseArgs {
        match self {
            Command::Prep { release } | Command::Release { release, .. } => release,
        }
    }
}

/// Options shared by `prep` and `release`
#[derive(ClapArgs, Debug, Clone)]
pub struct ReleaseArgs {
    /// The release version that is being cut
    #[arg(value_name = "VERSION")]
    pub version: String,

    /// The source branch name from which we are cutting the candidate
    #[arg(long)]
    pub source_branch: String,

    /// The candidate branch name
    #[arg(long)]
    pub candidate_branch: String,

    /// The name of the branch into which we are merging the candidate
    #[arg(long)]
    pub release_branch: String,

    /// The Git repository that we are targeting
    #[arg(long)]
    pub git_repository_name: String,

    /// The GitHub organization that contains the targeted repository
    #[arg(long)]
    pub github_organization: String,

    /// Space separated engine version source branches
    #[arg(long)]
    pub engine_versions: Option<String>,

    /// GitHub token (falls back to GITHUB_TOKEN, then GH_TOKEN)
    #[arg(long)]
    pub github_token: Option<String>,

    /// File containing the GitHub token
    #[arg(long, value_name = "PATH", conflicts_with = "github_token")]
    pub github_token_file: Option<PathBuf>,

    /// Keep pipeline metadata in this JSON file instead of the Buildkite agent
    #[arg(long, value_name = "PATH")]
    pub metadata_file: Option<PathBuf>,

    /// Directory working copies are cloned into
    #[arg(long, value_name = "PATH")]
    pub work_dir: Option<PathBuf>,

    /// Leave working copies on disk after the run
    #[arg(long)]
    pub keep_checkouts: bool,
}

impl Args {
    /// Parse command line arguments, leaving usage errors to the caller
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}
