//! CLI argument definitions using clap
//!
//! Commands:
//! - campusdb start --config <path>
//! - campusdb query --records <path> --kind <kind> --id <id> --query <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// campusdb - a deterministic in-memory query service for campus datasets
#[derive(Parser, Debug)]
#[command(name = "campusdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the campusdb HTTP server
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./campusdb.json")]
        config: PathBuf,
    },

    /// Evaluate a single query against a record file and exit
    Query {
        /// Path to a JSON array of flat records
        #[arg(long)]
        records: PathBuf,

        /// Record kind: sections or rooms
        #[arg(long)]
        kind: String,

        /// Dataset id the query is bound to
        #[arg(long)]
        id: String,

        /// Path to the query JSON
        #[arg(long)]
        query: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
