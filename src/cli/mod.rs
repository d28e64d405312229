//! CLI module for the REST shim
//!
//! Provides command-line interface for:
//! - init: Write a default configuration file
//! - serve: Load config, build tables and serve HTTP
//! - translate: One-shot query-string translation

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, run_command, serve, translate, translate_query};
pub use errors::{CliError, CliErrorCode, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}
