//! Stub image loading and validation.

use crate::binder::payload::overlay;
use std::{fmt, path::Path};

/// Object format of a stub image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Pe,
    Elf,
    MachO,
}

impl ImageFormat {
    /// Whether the format carries Windows resources (icons).
    pub fn has_resources(self) -> bool {
        matches!(self, ImageFormat::Pe)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageFormat::Pe => "PE",
            ImageFormat::Elf => "ELF",
            ImageFormat::MachO => "Mach-O",
        })
    }
}

/// A stub image ready to receive a payload.
pub struct StubImage {
    /// Image bytes with any previous overlay removed.
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

/// Reads the stub image at `path`, strips a previous overlay, and checks that
/// the rest is a native executable.
///
/// Errors are diagnostic messages.
pub async fn load(path: &Path) -> Result<StubImage, String> {
    let mut bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("cannot read stub image {}: {e}", path.display()))?;

    let image_len = overlay::strip(&bytes)
        .map_err(|e| format!("stub image {} has a damaged overlay: {e}", path.display()))?
        .len();
    if image_len != bytes.len() {
        log::debug!(
            "Stripping {} bytes of existing overlay from {}",
            bytes.len() - image_len,
            path.display()
        );
        bytes.truncate(image_len);
    }

    let format = detect(&bytes)
        .map_err(|e| format!("stub image {} is not usable: {e}", path.display()))?;
    log::debug!("Stub image {} is {}", path.display(), format);

    Ok(StubImage { bytes, format })
}

/// Identifies the object format with goblin.
pub fn detect(image: &[u8]) -> Result<ImageFormat, String> {
    match goblin::Object::parse(image) {
        Ok(goblin::Object::PE(_)) => Ok(ImageFormat::Pe),
        Ok(goblin::Object::Elf(_)) => Ok(ImageFormat::Elf),
        Ok(goblin::Object::Mach(_)) => Ok(ImageFormat::MachO),
        Ok(_) => Err("not a native executable".to_string()),
        Err(e) => Err(format!("failed to parse binary with goblin: {e}")),
    }
}
