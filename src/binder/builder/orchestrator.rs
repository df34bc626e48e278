//! Main bind orchestration.
//!
//! This module provides the [`Binder`] orchestrator that validates a
//! [`FileRegistry`], encodes its payload, and hands both to the assembly step.

use super::{
    assemble::{Assembly, assemble},
    result::{BuildResult, Diagnostic},
    validation,
};
use crate::binder::{
    BindSettings, Result,
    payload::Payload,
    registry::FileRegistry,
    utils::fs::remove_file_if_exists,
};
use std::path::Path;

/// Main bind orchestrator.
///
/// Produces a single executable that carries every registered file and, when
/// run, extracts them to `<temp>/<output stem> Binds/` and launches the ones
/// flagged executable.
///
/// # Examples
///
/// ```no_run
/// use file_binder::binder::{Binder, FileRegistry, SettingsBuilder};
///
/// # async fn example() -> file_binder::binder::Result<()> {
/// let mut registry = FileRegistry::new();
/// registry.add_file("setup.exe", true, true).await?;
/// registry.add_file("readme.txt", false, false).await?;
///
/// let binder = Binder::new(SettingsBuilder::new().build());
/// let result = binder.bind(&registry, "dist/Bundle.exe", None).await?;
/// if !result.success {
///     eprintln!("{}", result.messages());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Binder {
    settings: BindSettings,
}

impl Binder {
    /// Creates a new binder with the given settings.
    pub fn new(settings: BindSettings) -> Self {
        Self { settings }
    }

    /// Returns the settings this binder was created with.
    pub fn settings(&self) -> &BindSettings {
        &self.settings
    }

    /// Binds the registered files into the executable at `output`.
    ///
    /// Precondition violations are raised as errors before anything touches
    /// the filesystem:
    ///
    /// 1. fewer than two files, or none flagged executable
    /// 2. an empty output path or one ending in a separator
    /// 3. an icon that does not exist or is not an `.ico` file
    ///
    /// Everything after that is reported through the returned
    /// [`BuildResult`]. An existing file at `output` is removed first, so a
    /// failed bind never leaves a stale executable behind.
    pub async fn bind(
        &self,
        registry: &FileRegistry,
        output: impl AsRef<Path>,
        icon: Option<&Path>,
    ) -> Result<BuildResult> {
        let output = output.as_ref();

        validation::check_registry(registry)?;
        let label = validation::check_output_path(output)?;
        if let Some(icon) = icon {
            validation::check_icon_path(icon).await?;
        }

        log::info!(
            "Binding {} files into {}",
            registry.len(),
            output.display()
        );

        match remove_file_if_exists(output).await {
            Ok(true) => log::debug!("Removed existing output {}", output.display()),
            Ok(false) => {}
            Err(e) => {
                return Ok(BuildResult::failed(vec![Diagnostic::error(format!(
                    "cannot remove existing output {}: {e}",
                    output.display()
                ))]));
            }
        }

        let payload = Payload::encode(&label, registry.files());
        log::debug!("Encoded payload {:?} ({} bytes)", label, payload.len());

        let stub = match self.settings.stub_source().resolve() {
            Ok(stub) => stub,
            Err(e) => {
                return Ok(BuildResult::failed(vec![Diagnostic::error(format!(
                    "cannot locate stub image: {e}"
                ))]));
            }
        };

        Ok(assemble(Assembly {
            stub: &stub,
            payload: &payload,
            icon,
            output,
        })
        .await)
    }
}
