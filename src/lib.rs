//! File binder library for creating self-extracting executables
//!
//! This library combines several files into one executable that, when run,
//! extracts them to a temporary directory and starts the ones flagged
//! executable, optionally elevated.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod binder;
pub mod cli;
pub mod error;
pub mod manifest;

// Re-export commonly used types
pub use error::{BinderError, CliError, Result};
