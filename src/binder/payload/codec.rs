//! Text-safe payload codec.
//!
//! Every field is a netstring (`<decimal length>:<content>,`), so no field
//! content can be mistaken for framing. Names and file data are base64,
//! flags are the literals `true`/`false`, sizes are decimal. All entry headers
//! come before any data so a reader knows every name and flag up front.
//!
//! ```text
//! FBP1
//! <label b64>  <count>
//! <name b64> <executable> <administrator> <size>     x count
//! <data b64>                                         x count
//! ```

use crate::binder::{
    error::{Error, Result},
    registry::{BoundFile, validate_name},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::{
    fmt::Write as _,
    io::{self, BufRead, Read, Write},
};

/// Leading bytes of every payload.
pub const PAYLOAD_MAGIC: &[u8; 4] = b"FBP1";

/// Upper bound on a header field, so corrupt lengths cannot force huge allocations.
const MAX_HEADER_FIELD: u64 = 64 * 1024;

/// Longest decimal length prefix accepted.
const MAX_LEN_DIGITS: usize = 20;

const CHUNK_SIZE: usize = 8192;

/// Name and flags of one embedded file.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct EntryHeader {
    pub name: String,
    pub is_executable: bool,
    pub is_administrator: bool,
    /// Decoded size in bytes.
    pub size: u64,
}

/// Everything a payload declares before its data section.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PayloadHeader {
    /// Output base name captured at bind time.
    pub label: String,
    pub entries: Vec<EntryHeader>,
}

impl PayloadHeader {
    /// True if any entry asks for elevated execution.
    pub fn requires_elevation(&self) -> bool {
        self.entries.iter().any(|e| e.is_administrator)
    }
}

/// Encoded, embeddable form of a file set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload(String);

impl Payload {
    /// Encodes `files` in order under `label`.
    pub fn encode(label: &str, files: &[BoundFile]) -> Self {
        let mut out = String::from_utf8_lossy(PAYLOAD_MAGIC).into_owned();

        put_field(&mut out, &STANDARD.encode(label));
        put_field(&mut out, &files.len().to_string());

        for file in files {
            put_field(&mut out, &STANDARD.encode(file.name()));
            put_field(&mut out, bool_literal(file.is_executable()));
            put_field(&mut out, bool_literal(file.is_administrator()));
            put_field(&mut out, &file.data().len().to_string());
        }
        for file in files {
            put_field(&mut out, &STANDARD.encode(file.data()));
        }

        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes the whole payload into memory.
    pub fn decode(&self) -> Result<(PayloadHeader, Vec<BoundFile>)> {
        decode(self.as_bytes())
    }
}

/// Decodes an encoded payload held in memory.
pub fn decode(bytes: &[u8]) -> Result<(PayloadHeader, Vec<BoundFile>)> {
    let mut reader = PayloadReader::new(bytes)?;
    let header = reader.header().clone();

    let mut files = Vec::with_capacity(header.entries.len());
    for entry in &header.entries {
        let mut data = Vec::new();
        match reader.copy_next(&mut data)? {
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(Error::IoError(e)),
            None => return Err(Error::Payload("entry data missing".into())),
        }
        let file = BoundFile::new(entry.name.clone(), data)
            .map_err(|e| Error::Payload(e.to_string()))?
            .with_flags(entry.is_executable, entry.is_administrator);
        files.push(file);
    }

    Ok((header, files))
}

fn put_field(out: &mut String, content: &str) {
    // Writing into a String cannot fail.
    let _ = write!(out, "{}:{},", content.len(), content);
}

fn bool_literal(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Streaming payload decoder.
///
/// Parses the header on construction, then hands out entry data one entry at
/// a time, decoding base64 in fixed-size chunks.
pub struct PayloadReader<R> {
    inner: R,
    header: PayloadHeader,
    next: usize,
}

impl<R: BufRead> PayloadReader<R> {
    /// Reads the magic and the header section.
    pub fn new(mut inner: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        inner
            .read_exact(&mut magic)
            .map_err(|_| Error::Payload("payload is truncated before its magic".into()))?;
        if &magic != PAYLOAD_MAGIC {
            return Err(Error::Payload("payload magic mismatch".into()));
        }

        let label = read_text_b64(&mut inner, "label")?;
        validate_name(&label).map_err(|e| Error::Payload(format!("label: {e}")))?;

        let count: usize = read_decimal(&mut inner, "entry count")?
            .try_into()
            .map_err(|_| Error::Payload("entry count out of range".into()))?;

        let mut entries = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            // Entry names are checked per entry by the consumer, which skips
            // the ones it cannot place.
            let name = read_text_b64(&mut inner, "entry name")?;
            let is_executable = read_bool(&mut inner, "executable flag")?;
            let is_administrator = read_bool(&mut inner, "administrator flag")?;
            let size = read_decimal(&mut inner, "entry size")?;
            entries.push(EntryHeader {
                name,
                is_executable,
                is_administrator,
                size,
            });
        }

        Ok(Self {
            inner,
            header: PayloadHeader { label, entries },
            next: 0,
        })
    }

    pub fn header(&self) -> &PayloadHeader {
        &self.header
    }

    /// Index of the entry the next `copy_next`/`skip_next` call consumes.
    pub fn position(&self) -> usize {
        self.next
    }

    /// Decodes the next entry's data into `out`.
    ///
    /// Returns `Ok(None)` once every entry has been consumed. The outer error
    /// means the payload itself is broken; the inner one reports a failure of
    /// `out`, after which the reader is still positioned on the next entry.
    pub fn copy_next<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<Option<io::Result<u64>>> {
        let Some(expected) = self.header.entries.get(self.next).map(|e| e.size) else {
            return Ok(None);
        };
        let index = self.next;
        self.next += 1;

        let len = read_len(&mut self.inner, "entry data")?;
        let mut limited = (&mut self.inner).take(len);
        let mut written = 0u64;
        let mut write_error = None;
        {
            let mut decoder = base64::read::DecoderReader::new(&mut limited, &STANDARD);
            let mut buf = [0u8; CHUNK_SIZE];
            loop {
                let n = decoder
                    .read(&mut buf)
                    .map_err(|e| Error::Payload(format!("entry {index} data: {e}")))?;
                if n == 0 {
                    break;
                }
                if let Err(e) = out.write_all(&buf[..n]) {
                    write_error = Some(e);
                    break;
                }
                written += n as u64;
            }
        }

        if let Some(e) = write_error {
            io::copy(&mut limited, &mut io::sink())
                .map_err(|e| Error::Payload(format!("entry {index} data: {e}")))?;
            check_remaining(limited.limit(), "entry data")?;
            expect_comma(&mut self.inner, "entry data")?;
            return Ok(Some(Err(e)));
        }

        check_remaining(limited.limit(), "entry data")?;
        expect_comma(&mut self.inner, "entry data")?;

        if written != expected {
            return Err(Error::Payload(format!(
                "entry {index} declares {expected} bytes but holds {written}"
            )));
        }

        Ok(Some(out.flush().map(|_| written)))
    }

    /// Consumes the next entry's data without decoding it.
    ///
    /// Returns false once every entry has been consumed.
    pub fn skip_next(&mut self) -> Result<bool> {
        if self.next >= self.header.entries.len() {
            return Ok(false);
        }
        self.next += 1;

        let len = read_len(&mut self.inner, "entry data")?;
        let mut limited = (&mut self.inner).take(len);
        io::copy(&mut limited, &mut io::sink())
            .map_err(|e| Error::Payload(format!("skipping entry data: {e}")))?;
        check_remaining(limited.limit(), "entry data")?;
        expect_comma(&mut self.inner, "entry data")?;
        Ok(true)
    }
}

fn read_len<R: BufRead>(r: &mut R, what: &str) -> Result<u64> {
    let mut digits = String::new();
    loop {
        let mut byte = [0u8; 1];
        r.read_exact(&mut byte)
            .map_err(|_| Error::Payload(format!("{what}: truncated length prefix")))?;
        match byte[0] {
            b':' => break,
            b @ b'0'..=b'9' if digits.len() < MAX_LEN_DIGITS => digits.push(b as char),
            other => {
                return Err(Error::Payload(format!(
                    "{what}: unexpected byte {other:#04x} in length prefix"
                )));
            }
        }
    }
    if digits.is_empty() {
        return Err(Error::Payload(format!("{what}: empty length prefix")));
    }
    digits
        .parse()
        .map_err(|_| Error::Payload(format!("{what}: length prefix out of range")))
}

fn expect_comma<R: Read>(r: &mut R, what: &str) -> Result<()> {
    let mut byte = [0u8; 1];
    r.read_exact(&mut byte)
        .map_err(|_| Error::Payload(format!("{what}: missing field terminator")))?;
    if byte[0] != b',' {
        return Err(Error::Payload(format!("{what}: missing field terminator")));
    }
    Ok(())
}

fn check_remaining(remaining: u64, what: &str) -> Result<()> {
    if remaining != 0 {
        return Err(Error::Payload(format!("{what}: truncated field")));
    }
    Ok(())
}

/// Reads one small field whole.
fn read_field<R: BufRead>(r: &mut R, what: &str) -> Result<Vec<u8>> {
    let len = read_len(r, what)?;
    if len > MAX_HEADER_FIELD {
        return Err(Error::Payload(format!("{what}: field of {len} bytes is too long")));
    }
    let mut content = vec![0u8; len as usize];
    r.read_exact(&mut content)
        .map_err(|_| Error::Payload(format!("{what}: truncated field")))?;
    expect_comma(r, what)?;
    Ok(content)
}

fn read_text_b64<R: BufRead>(r: &mut R, what: &str) -> Result<String> {
    let raw = read_field(r, what)?;
    let decoded = STANDARD
        .decode(&raw)
        .map_err(|e| Error::Payload(format!("{what}: {e}")))?;
    String::from_utf8(decoded).map_err(|_| Error::Payload(format!("{what}: not valid UTF-8")))
}

fn read_decimal<R: BufRead>(r: &mut R, what: &str) -> Result<u64> {
    let raw = read_field(r, what)?;
    std::str::from_utf8(&raw)
        .ok()
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::Payload(format!("{what}: not a decimal number")))
}

fn read_bool<R: BufRead>(r: &mut R, what: &str) -> Result<bool> {
    match read_field(r, what)?.as_slice() {
        b"true" => Ok(true),
        b"false" => Ok(false),
        _ => Err(Error::Payload(format!("{what}: expected true or false"))),
    }
}
