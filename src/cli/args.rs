//! CLI argument definitions using clap
//!
//! Commands:
//! - orthoplus init --config <path>
//! - orthoplus serve --config <path> [--port <port>]
//! - orthoplus translate <query> [--strict]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ortho+ REST shim - PostgREST-style record API
#[derive(Parser, Debug)]
#[command(name = "orthoplus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./orthoplus.json")]
        config: PathBuf,
    },

    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./orthoplus.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the structured query for a query string and exit
    Translate {
        /// Query string, e.g. "status=eq.ACTIVE&order=name.asc&limit=5"
        query: String,

        /// Reject malformed filter clauses instead of dropping them
        #[arg(long)]
        strict: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
