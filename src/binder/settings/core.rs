//! Core BindSettings struct and implementations.

use std::path::{Path, PathBuf};

/// Where the executable image that carries the payload comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StubSource {
    /// The running binder executable. It recognizes its own overlay at
    /// startup, so a copy of it acts as the stub.
    #[default]
    CurrentExe,

    /// A prebuilt stub image on disk.
    Path(PathBuf),
}

impl StubSource {
    /// Resolves the source to a concrete file path.
    pub fn resolve(&self) -> std::io::Result<PathBuf> {
        match self {
            StubSource::CurrentExe => std::env::current_exe(),
            StubSource::Path(path) => Ok(path.clone()),
        }
    }
}

/// Settings for [`Binder`](crate::binder::Binder).
///
/// # Examples
///
/// ```no_run
/// use file_binder::binder::{SettingsBuilder, StubSource};
///
/// let settings = SettingsBuilder::new()
///     .stub_image("target/release/file_binder")
///     .build();
/// assert!(matches!(settings.stub_source(), StubSource::Path(_)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct BindSettings {
    /// Stub image for produced executables.
    ///
    /// Default: [`StubSource::CurrentExe`]
    stub_source: StubSource,
}

impl BindSettings {
    pub(crate) fn new(stub_source: StubSource) -> Self {
        Self { stub_source }
    }

    /// Returns the stub image source.
    pub fn stub_source(&self) -> &StubSource {
        &self.stub_source
    }

    /// Returns the explicit stub image path, if one was configured.
    pub fn stub_path(&self) -> Option<&Path> {
        match &self.stub_source {
            StubSource::Path(path) => Some(path),
            StubSource::CurrentExe => None,
        }
    }
}
