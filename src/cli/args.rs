//! CLI argument definitions using clap
//!
//! Commands:
//! - balades serve [--config <path>] [--host] [--port] [--data-dir]
//! - balades import --file <path> [--config <path>] [--data-dir]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Balades - REST API over Paris walking-tour points of interest
#[derive(Parser, Debug)]
#[command(name = "balades")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, env = "BALADES_CONFIG")]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Load a JSON array of balades into the store
    Import {
        /// JSON file holding an array of balade documents
        #[arg(long)]
        file: PathBuf,

        /// Path to configuration file
        #[arg(long, env = "BALADES_CONFIG")]
        config: Option<PathBuf>,

        /// Data directory (overrides the configuration file)
        #[arg(long, env = "BALADES_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },
}

/// Values that take precedence over the configuration file
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Host to bind to
    #[arg(long, env = "BALADES_HOST")]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(long, env = "BALADES_PORT")]
    pub port: Option<u16>,

    /// Data directory; without one the store lives in memory
    #[arg(long, env = "BALADES_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
