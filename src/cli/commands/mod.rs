//! Subcommand execution and exit codes.
//!
//! Both subcommands exit 0 on every successful terminal state, including
//! "no release branch yet" and "nothing to merge back", and 1 on any error.

mod helpers;
mod prep;
mod release;

use crate::cli::{Args, Command};
use crate::error::Result;
use log::{error, info};

use prep::execute_prep;
use release::execute_release;

/// Execute the parsed command, returning the process exit code
pub async fn execute_command(args: Args) -> Result<i32> {
    let result = match &args.command {
        Command::Prep { release } => execute_prep(release).await,
        Command::Release {
            pull_request_url,
            release,
        } => execute_release(release, pull_request_url).await,
    };

    match result {
        Ok(()) => {
            info!("Command '{}' completed successfully", args.command.name());
            Ok(0)
        }
        Err(e) => {
            error!("Command '{}' failed: {}", args.command.name(), e);

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                info!("Recovery suggestions:");
                for suggestion in suggestions {
                    info!("  • {}", suggestion);
                }
            }

            Ok(1)
        }
    }
}
