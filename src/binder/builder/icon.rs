//! Icon resources for produced executables.
//!
//! An `.ico` file maps onto one `RT_ICON` resource per image plus an
//! `RT_GROUP_ICON` directory that references them by id.

use crate::{
    bail,
    binder::error::{Context, ErrorExt, Result},
};
use std::path::Path;

/// Resource id of the group directory.
pub const GROUP_ICON_ID: u16 = 1;

/// One image of an icon, ready to become an `RT_ICON` resource.
#[derive(Clone, Debug)]
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    /// Encoded image data (BMP or PNG) as stored in the `.ico`.
    pub data: Vec<u8>,
}

/// Parsed `.ico` file.
#[derive(Clone, Debug)]
pub struct IconGroup {
    pub images: Vec<IconImage>,
}

impl IconGroup {
    /// Serializes the `GRPICONDIR` structure, numbering images from `first_id`.
    pub fn group_resource(&self, first_id: u16) -> Vec<u8> {
        let mut out = Vec::with_capacity(6 + 14 * self.images.len());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&(self.images.len() as u16).to_le_bytes());

        for (offset, image) in self.images.iter().enumerate() {
            out.push(dimension_byte(image.width));
            out.push(dimension_byte(image.height));
            out.push(0); // color count
            out.push(0); // reserved
            out.extend_from_slice(&1u16.to_le_bytes()); // planes
            out.extend_from_slice(&image.bits_per_pixel.to_le_bytes());
            out.extend_from_slice(&(image.data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(first_id + offset as u16).to_le_bytes());
        }
        out
    }
}

/// 256 is stored as 0.
fn dimension_byte(value: u32) -> u8 {
    if value >= 256 { 0 } else { value as u8 }
}

/// Parses the icon file at `path`.
pub fn load(path: &Path) -> Result<IconGroup> {
    let file = std::fs::File::open(path).fs_context("opening icon", path)?;
    let dir = ico::IconDir::read(file)
        .context(format!("{} is not a valid icon", path.display()))?;

    if dir.resource_type() != ico::ResourceType::Icon {
        bail!("{} is a cursor file, not an icon", path.display());
    }
    if dir.entries().is_empty() {
        bail!("{} contains no images", path.display());
    }
    if dir.entries().len() > u16::MAX as usize - GROUP_ICON_ID as usize {
        bail!("{} contains too many images", path.display());
    }

    let images = dir
        .entries()
        .iter()
        .map(|entry| IconImage {
            width: entry.width(),
            height: entry.height(),
            bits_per_pixel: entry.bits_per_pixel(),
            data: entry.data().to_vec(),
        })
        .collect();

    Ok(IconGroup { images })
}

/// Replaces the icon resources of the PE file at `exe`.
#[cfg(windows)]
pub fn embed(exe: &Path, group: &IconGroup) -> Result<()> {
    use windows::{
        Win32::{
            System::LibraryLoader::{BeginUpdateResourceW, EndUpdateResourceW, UpdateResourceW},
            UI::WindowsAndMessaging::{RT_GROUP_ICON, RT_ICON},
        },
        core::{HSTRING, PCWSTR},
    };

    const LANG_NEUTRAL: u16 = 0;
    let resource_id = |id: u16| PCWSTR(id as usize as *const u16);
    let win_err = |what: &str, e: windows::core::Error| {
        crate::binder::Error::GenericError(format!("{what} for {}: {e}", exe.display()))
    };

    let path = HSTRING::from(exe.as_os_str());
    let handle = unsafe { BeginUpdateResourceW(PCWSTR(path.as_ptr()), false) }
        .map_err(|e| win_err("BeginUpdateResourceW failed", e))?;

    let first_id = GROUP_ICON_ID + 1;
    let mut outcome = Ok(());
    for (offset, image) in group.images.iter().enumerate() {
        let update = unsafe {
            UpdateResourceW(
                handle,
                RT_ICON,
                resource_id(first_id + offset as u16),
                LANG_NEUTRAL,
                Some(image.data.as_ptr().cast()),
                image.data.len() as u32,
            )
        };
        if let Err(e) = update {
            outcome = Err(win_err("adding icon image", e));
            break;
        }
    }

    if outcome.is_ok() {
        let directory = group.group_resource(first_id);
        let update = unsafe {
            UpdateResourceW(
                handle,
                RT_GROUP_ICON,
                resource_id(GROUP_ICON_ID),
                LANG_NEUTRAL,
                Some(directory.as_ptr().cast()),
                directory.len() as u32,
            )
        };
        if let Err(e) = update {
            outcome = Err(win_err("adding icon group", e));
        }
    }

    let discard = outcome.is_err();
    let end = unsafe { EndUpdateResourceW(handle, discard) };
    outcome?;
    end.map_err(|e| win_err("EndUpdateResourceW failed", e))
}
