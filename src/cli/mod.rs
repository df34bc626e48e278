//! Command line interface for the file binder.
//!
//! This module provides argument parsing, command dispatch, and user
//! feedback for the `bind` and `inspect` commands.

mod args;
pub mod commands;
mod output;

pub use args::{Args, BindArgs, Command, FileRole, InspectArgs, RuntimeConfig};
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    run_with(args).await
}

/// Executes already parsed arguments
pub async fn run_with(args: Args) -> Result<i32> {
    let config = RuntimeConfig::from(&args);
    log::debug!("Running {:?}", args.command);

    match &args.command {
        Command::Bind(bind) => commands::execute_bind(bind, &config).await,
        Command::Inspect(inspect) => commands::execute_inspect(inspect, &config).await,
    }
}

/// Validate arguments without executing (for testing)
pub fn validate_args(args: &Args) -> std::result::Result<(), String> {
    args.validate()
}
