//! CLI module for the Balades service
//!
//! Provides command-line interface for:
//! - serve: Open the store and run the HTTP API
//! - import: Bulk-load balades from a JSON file

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command, Overrides};
pub use commands::{import, import_file, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
