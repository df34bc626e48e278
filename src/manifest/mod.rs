//! Bind manifests.
//!
//! A TOML file describing a whole bind:
//!
//! ```toml
//! output = "Output.exe"
//! icon = "app.ico"
//!
//! [[file]]
//! path = "setup.exe"
//! executable = true
//! administrator = true
//!
//! [[file]]
//! path = "readme.txt"
//! ```
//!
//! Relative paths are resolved against the directory holding the manifest.

use crate::error::{BinderError, CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One `[[file]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestFile {
    /// File to bind
    pub path: PathBuf,

    /// Start the file after extraction
    #[serde(default)]
    pub executable: bool,

    /// Request elevation for the file
    #[serde(default)]
    pub administrator: bool,
}

/// Parsed bind manifest with paths already resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindManifest {
    /// Output executable path
    pub output: Option<PathBuf>,

    /// Icon for the output executable
    pub icon: Option<PathBuf>,

    /// Stub image to use instead of the running binder
    pub stub: Option<PathBuf>,

    /// Files in bind order
    #[serde(default, rename = "file")]
    pub files: Vec<ManifestFile>,
}

impl BindManifest {
    /// Parses a manifest from TOML text without touching paths.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads the manifest at `path` and resolves its relative paths against
    /// the manifest's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BinderError::Cli(CliError::ExecutionFailed {
                command: "read_manifest".to_string(),
                reason: format!("Failed to read {}: {}", path.display(), e),
            })
        })?;

        let mut manifest = Self::parse(&text)?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        manifest.resolve_paths(base);

        log::debug!(
            "Loaded manifest {} with {} files",
            path.display(),
            manifest.files.len()
        );
        Ok(manifest)
    }

    /// Rebases every relative path onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        if let Some(output) = self.output.as_mut() {
            rebase(output);
        }
        if let Some(icon) = self.icon.as_mut() {
            rebase(icon);
        }
        if let Some(stub) = self.stub.as_mut() {
            rebase(stub);
        }
        for file in &mut self.files {
            rebase(&mut file.path);
        }
    }
}
