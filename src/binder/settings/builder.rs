//! Builder for constructing BindSettings.

use super::{BindSettings, StubSource};
use std::path::{Path, PathBuf};

/// Builder for constructing [`BindSettings`].
///
/// # Examples
///
/// ```no_run
/// use file_binder::binder::SettingsBuilder;
///
/// let settings = SettingsBuilder::new().build();
/// assert!(settings.stub_path().is_none());
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    stub_image: Option<PathBuf>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Uses a prebuilt stub image instead of the running executable.
    pub fn stub_image<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.stub_image = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the stub image only when `path` is `Some`.
    pub fn maybe_stub_image<P: AsRef<Path>>(self, path: Option<P>) -> Self {
        match path {
            Some(path) => self.stub_image(path),
            None => self,
        }
    }

    /// Builds the settings.
    pub fn build(self) -> BindSettings {
        let source = self
            .stub_image
            .map(StubSource::Path)
            .unwrap_or_default();
        BindSettings::new(source)
    }
}
