//! Payload encoding and embedding.
//!
//! - [`codec`] - length-prefixed, text-safe encoding of the file set
//! - [`overlay`] - appending a payload to a stub image and finding it again

pub mod codec;
pub mod overlay;

pub use codec::{EntryHeader, PAYLOAD_MAGIC, Payload, PayloadHeader, PayloadReader, decode};
pub use overlay::{OVERLAY_MAGIC, OverlayLocation, OverlayReader};
