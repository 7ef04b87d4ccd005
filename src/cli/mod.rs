//! Command line interface for release_tool.

mod args;
pub mod commands;

pub use args::{Args, Command, ReleaseArgs};
pub use commands::execute_command;

use crate::error::Result;

/// Main CLI entry point. Usage errors exit 1 like every other failure;
/// `--help` and `--version` exit 0.
pub async fn run() -> Result<i32> {
    let args = match Args::try_parse_args() {
        Ok(args) => args,
        Err(e) => {
            let exit_code = if e.use_stderr() { 1 } else { 0 };
            // Printing help or usage can only fail on a closed stdout/stderr
            let _ = e.print();
            return Ok(exit_code);
        }
    };
    execute_command(args).await
}
