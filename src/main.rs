//! release_tool binary: parse arguments, run the subcommand, exit 0 or 1.

use release_tool::cli;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match cli::run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            log::error!("Fatal error: {e}");
            for suggestion in e.recovery_suggestions() {
                log::info!("  • {}", suggestion);
            }
            process::exit(1);
        }
    }
}
