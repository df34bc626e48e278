//! Payload overlay appended to a stub image.
//!
//! ```text
//! [stub image]
//! [payload text]
//! [payload length: u64 LE][magic: "FBNDOVL1"]
//! ```
//!
//! The footer sits at a fixed offset from the end of the file, so the stub can
//! find its payload without knowing the size of its own image.

use super::codec::{Payload, PayloadReader};
use crate::binder::error::{ErrorExt, Result};
use std::{
    fs::File,
    io::{self, BufReader, Read, Seek, SeekFrom, Take, Write},
    path::Path,
};

/// Trailing magic identifying an overlay.
pub const OVERLAY_MAGIC: &[u8; 8] = b"FBNDOVL1";

/// Size of the fixed footer.
pub const FOOTER_LEN: u64 = 16;

/// Where an overlay sits inside an executable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayLocation {
    /// Length of the executable image preceding the payload.
    pub image_len: u64,
    /// Length of the payload text.
    pub payload_len: u64,
}

/// Reader over the payload carried by an executable.
pub type OverlayReader = PayloadReader<BufReader<Take<File>>>;

fn parse_footer(footer: &[u8; FOOTER_LEN as usize], total_len: u64) -> io::Result<Option<OverlayLocation>> {
    if &footer[8..] != OVERLAY_MAGIC {
        return Ok(None);
    }
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&footer[..8]);
    let payload_len = u64::from_le_bytes(len_bytes);

    let body_len = total_len - FOOTER_LEN;
    if payload_len > body_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "overlay footer declares more payload than the file holds",
        ));
    }

    Ok(Some(OverlayLocation {
        image_len: body_len - payload_len,
        payload_len,
    }))
}

/// Finds the overlay in a seekable stream, if there is one.
pub fn locate<R: Read + Seek>(reader: &mut R) -> io::Result<Option<OverlayLocation>> {
    let total_len = reader.seek(SeekFrom::End(0))?;
    if total_len < FOOTER_LEN {
        return Ok(None);
    }
    reader.seek(SeekFrom::End(-(FOOTER_LEN as i64)))?;
    let mut footer = [0u8; FOOTER_LEN as usize];
    reader.read_exact(&mut footer)?;
    parse_footer(&footer, total_len)
}

/// Returns the executable image without any overlay it carries.
pub fn strip(image: &[u8]) -> io::Result<&[u8]> {
    let total_len = image.len() as u64;
    if total_len < FOOTER_LEN {
        return Ok(image);
    }
    let mut footer = [0u8; FOOTER_LEN as usize];
    footer.copy_from_slice(&image[image.len() - FOOTER_LEN as usize..]);
    match parse_footer(&footer, total_len)? {
        Some(location) => Ok(&image[..location.image_len as usize]),
        None => Ok(image),
    }
}

/// Footer that follows `payload`.
pub fn footer(payload: &Payload) -> [u8; FOOTER_LEN as usize] {
    let mut footer = [0u8; FOOTER_LEN as usize];
    footer[..8].copy_from_slice(&(payload.len() as u64).to_le_bytes());
    footer[8..].copy_from_slice(OVERLAY_MAGIC);
    footer
}

/// Writes the payload and footer to `out`, which must be positioned at the
/// end of the stub image.
pub fn append<W: Write>(out: &mut W, payload: &Payload) -> io::Result<()> {
    out.write_all(payload.as_bytes())?;
    out.write_all(&footer(payload))?;
    out.flush()
}

/// Opens the payload carried by the executable at `path`.
///
/// Returns `Ok(None)` when the file has no overlay.
pub fn open(path: &Path) -> Result<Option<OverlayReader>> {
    let mut file = File::open(path).fs_context("opening executable", path)?;
    let Some(location) = locate(&mut file).fs_context("reading overlay footer", path)? else {
        return Ok(None);
    };

    file.seek(SeekFrom::Start(location.image_len))
        .fs_context("seeking to payload", path)?;
    let reader = BufReader::new(file.take(location.payload_len));
    PayloadReader::new(reader).map(Some)
}
