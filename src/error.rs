//! Error types for the command line front end.
//!
//! Library failures arrive as [`crate::binder::Error`]; everything the CLI
//! adds on top (argument problems, manifest parsing) lives here.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BinderError>;

/// Main error type for CLI operations
#[derive(Error, Debug)]
pub enum BinderError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Binder library errors
    #[error("{0}")]
    Binder(#[from] crate::binder::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl BinderError {
    /// Exit code for this error: 2 for input the user can correct, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            BinderError::Cli(CliError::InvalidArguments { .. })
            | BinderError::Cli(CliError::MissingArgument { .. })
            | BinderError::Toml(_) => 2,
            BinderError::Binder(e) if e.is_validation() => 2,
            _ => 1,
        }
    }
}
