//! Bind outcome and diagnostics.

use serde::Serialize;
use std::{fmt, path::PathBuf};

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
        })
    }
}

/// One message from the assembly step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Result of [`Binder::bind`](super::Binder::bind).
///
/// `success` is true exactly when no diagnostic has [`DiagnosticSeverity::Error`].
/// On success the output exists and `output`, `size`, and `checksum` are set;
/// on failure nothing is left at the output path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BuildResult {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub output: Option<PathBuf>,
    /// Size of the produced executable in bytes.
    pub size: Option<u64>,
    /// Hex SHA-256 of the produced executable.
    pub checksum: Option<String>,
}

impl BuildResult {
    pub(crate) fn succeeded(
        diagnostics: Vec<Diagnostic>,
        output: PathBuf,
        size: u64,
        checksum: String,
    ) -> Self {
        Self {
            success: true,
            diagnostics,
            output: Some(output),
            size: Some(size),
            checksum: Some(checksum),
        }
    }

    pub(crate) fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            success: false,
            diagnostics,
            output: None,
            size: None,
            checksum: None,
        }
    }

    /// Diagnostics of error severity.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// All diagnostic messages joined by blank lines, for display.
    pub fn messages(&self) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.message.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
