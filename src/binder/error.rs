//! Error types for bind operations.
//!
//! Validation failures are raised as [`Error`] values. Problems inside the
//! assembly step are not errors at this level: they are reported as
//! diagnostics on the [`BuildResult`](super::BuildResult).

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};

/// Result type alias for bind operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the binder library.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The given path does not resolve to an existing regular file.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// A bind precondition failed.
    #[error("{0}")]
    Validation(String),

    /// An encoded payload could not be decoded.
    #[error("malformed payload: {0}")]
    Payload(String),

    /// Raw IO error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// IO error with the operation and path that caused it.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// What was being done
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        error: io::Error,
    },

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Returns true for precondition failures the caller can fix by changing input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::Validation(_))
    }
}

/// Attaches a path and operation to IO errors.
pub trait ErrorExt<T> {
    /// Wraps the error as [`Error::Fs`].
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for io::Result<T> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Adds a message to failures, turning them into [`Error::GenericError`].
pub trait Context<T> {
    /// Prefixes the error (or describes the missing value) with `context`.
    fn context<C: Display>(self, context: C) -> Result<T>;
}

impl<T, E: Display> Context<T> for std::result::Result<T, E> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }
}

/// Returns early with an [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::binder::Error::GenericError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_context_keeps_path_and_operation() {
        let err = Err::<(), _>(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            .fs_context("writing output", "/tmp/out.exe")
            .unwrap_err();
        assert_eq!(err.to_string(), "writing output /tmp/out.exe: denied");
    }

    #[test]
    fn option_context_describes_missing_value() {
        let err = None::<u8>.context("no stub image").unwrap_err();
        assert!(matches!(err, Error::GenericError(ref m) if m == "no stub image"));
    }

    #[test]
    fn validation_classification() {
        assert!(Error::Validation("x".into()).is_validation());
        assert!(Error::NotFound { path: "a".into() }.is_validation());
        assert!(!Error::Payload("x".into()).is_validation());
    }
}
