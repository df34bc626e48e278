//! Bind preconditions.
//!
//! Checked in order before any encoding work; the first failure is raised.

use crate::binder::{
    error::{Error, Result},
    registry::{FileRegistry, validate_name},
};
use std::path::Path;

/// Required extension for icon files.
pub const ICON_EXTENSION: &str = "ico";

/// Minimum number of files in a bind.
pub const MIN_FILES: usize = 2;

/// At least two files, at least one of them executable.
pub fn check_registry(registry: &FileRegistry) -> Result<()> {
    if registry.len() < MIN_FILES {
        return Err(Error::Validation(format!(
            "At least {MIN_FILES} files must be bound (got {})",
            registry.len()
        )));
    }
    if !registry.iter().any(|f| f.is_executable()) {
        return Err(Error::Validation(
            "At least 1 file must be executable".into(),
        ));
    }
    Ok(())
}

/// Rejects empty paths and paths naming a directory by a trailing separator,
/// and returns the output base name (file name without extension).
///
/// The base name becomes the payload label, so it must also be a plain file
/// name.
pub fn check_output_path(output: &Path) -> Result<String> {
    let raw = output.as_os_str().to_string_lossy();
    if raw.is_empty() || raw.ends_with('/') || raw.ends_with('\\') {
        return Err(Error::Validation(format!(
            "Invalid output file name: {raw:?}"
        )));
    }

    let label = output
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Validation(format!("Invalid output file name: {raw:?}")))?;
    validate_name(label)
        .map_err(|_| Error::Validation(format!("Invalid output file name: {raw:?}")))?;
    Ok(label.to_string())
}

/// The icon must exist and carry the `.ico` extension.
pub async fn check_icon_path(icon: &Path) -> Result<()> {
    let is_file = tokio::fs::metadata(icon)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(Error::NotFound {
            path: icon.to_path_buf(),
        });
    }

    let has_ico_extension = icon
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ICON_EXTENSION));
    if !has_ico_extension {
        return Err(Error::Validation(format!(
            "Icon {} must be a .{ICON_EXTENSION} file",
            icon.display()
        )));
    }
    Ok(())
}
