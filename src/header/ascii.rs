//! Ordered `KEY VALUE` header text
//!
//! Captured files begin with a NUL-padded block of header text whose size is
//! given by its own `HDR_SIZE` field. Lines are `KEY VALUE`; blank lines and
//! lines starting with `#` carry no fields.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, VoltcapError};
use crate::utils::read_full;

use super::keys;

/// Typed key/value access over ASCII header text
#[derive(Debug, Clone, Default)]
pub struct AsciiHeader {
    entries: Vec<(String, String)>,
}

impl AsciiHeader {
    /// Create an empty header
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse header text
    pub fn parse(text: &str) -> Result<Self> {
        let mut header = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = match line.split_once(char::is_whitespace) {
                Some((key, value)) => (key, value.trim()),
                None => (line, ""),
            };
            if !key.is_ascii() {
                return Err(VoltcapError::validation(key, "header keys must be ASCII"));
            }
            header.set(key, value);
        }
        Ok(header)
    }

    /// Parse header text from raw bytes, stopping at the first NUL
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let text = std::str::from_utf8(&bytes[..end]).map_err(|e| {
            VoltcapError::validation("header", format!("header text is not valid UTF-8: {}", e))
        })?;
        Self::parse(text)
    }

    /// Load a standalone header file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            VoltcapError::from_io(e, &format!("Failed to read header {}", path.display()))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Read the header block at the start of a byte stream
    ///
    /// Reads `size_hint` bytes, locates `HDR_SIZE`, then reads whatever
    /// remains of the header block. Bytes read beyond the header belong to
    /// the payload and are returned alongside the header.
    pub fn read_prefixed<R: Read>(reader: &mut R, size_hint: usize) -> Result<(Self, Vec<u8>)> {
        let mut buf = vec![0u8; size_hint.max(1)];
        let filled = read_full(reader, &mut buf)
            .map_err(|e| VoltcapError::from_io(e, "Failed to read header"))?;
        if filled == 0 {
            return Err(VoltcapError::io("stream is empty"));
        }
        buf.truncate(filled);

        let hdr_size = scan_header_size(&buf)?;
        if hdr_size > buf.len() {
            let already = buf.len();
            buf.resize(hdr_size, 0);
            let more = read_full(reader, &mut buf[already..])
                .map_err(|e| VoltcapError::from_io(e, "Failed to read header"))?;
            if already + more < hdr_size {
                return Err(VoltcapError::io(format!(
                    "header truncated: HDR_SIZE is {} but only {} bytes available",
                    hdr_size,
                    already + more
                )));
            }
        }

        let payload = buf.split_off(hdr_size);
        let header = Self::from_bytes(&buf)?;
        Ok((header, payload))
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Get the raw string value of a field
    pub fn get_val(&self, key: &str) -> Result<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| VoltcapError::validation(key, "missing header field"))
    }

    pub fn get_u32(&self, key: &str) -> Result<u32> {
        self.get_parsed(key, "unsigned 32-bit integer")
    }

    pub fn get_u64(&self, key: &str) -> Result<u64> {
        self.get_parsed(key, "unsigned 64-bit integer")
    }

    pub fn get_f64(&self, key: &str) -> Result<f64> {
        self.get_parsed(key, "floating point number")
    }

    fn get_parsed<T: FromStr>(&self, key: &str, kind: &str) -> Result<T> {
        let value = self.get_val(key)?;
        value
            .parse::<T>()
            .map_err(|_| VoltcapError::validation(key, format!("invalid {} '{}'", kind, value)))
    }

    /// Set a field, replacing it in place if already present
    pub fn set(&mut self, key: &str, value: impl fmt::Display) {
        let value = value.to_string();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Remove a field, returning whether it was present
    pub fn del(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field names in header order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// The full header text, one `KEY VALUE` line per field
    pub fn raw(&self) -> String {
        let mut text = String::new();
        for (key, value) in &self.entries {
            text.push_str(key);
            text.push(' ');
            text.push_str(value);
            text.push('\n');
        }
        text
    }

    /// Size of the header block declared by `HDR_SIZE`
    pub fn header_size(&self) -> Result<usize> {
        let size = self.get_u64(keys::HDR_SIZE)?;
        usize::try_from(size)
            .map_err(|_| VoltcapError::validation(keys::HDR_SIZE, "header size exceeds address space"))
    }

    /// Header text NUL-padded to `HDR_SIZE` bytes
    pub fn to_padded_bytes(&self) -> Result<Vec<u8>> {
        let size = self.header_size()?;
        let raw = self.raw();
        if raw.len() > size {
            return Err(VoltcapError::validation(
                keys::HDR_SIZE,
                format!("header text of {} bytes does not fit in {} bytes", raw.len(), size),
            ));
        }
        let mut bytes = raw.into_bytes();
        bytes.resize(size, 0);
        Ok(bytes)
    }
}

/// Locate `HDR_SIZE` in a header prefix that may be followed by payload bytes
fn scan_header_size(prefix: &[u8]) -> Result<usize> {
    let end = prefix.iter().position(|&b| b == 0).unwrap_or(prefix.len());
    for line in prefix[..end].split(|&b| b == b'\n') {
        let Ok(line) = std::str::from_utf8(line) else {
            break;
        };
        let mut fields = line.split_whitespace();
        if fields.next() != Some(keys::HDR_SIZE) {
            continue;
        }
        let value = fields.next().unwrap_or("");
        return match value.parse::<usize>() {
            Ok(0) => Err(VoltcapError::validation(keys::HDR_SIZE, "header size must be non-zero")),
            Ok(size) => Ok(size),
            Err(_) => Err(VoltcapError::validation(
                keys::HDR_SIZE,
                format!("invalid unsigned integer '{}'", value),
            )),
        };
    }
    Err(VoltcapError::validation(keys::HDR_SIZE, "missing header field"))
}

impl PartialEq for AsciiHeader {
    fn eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }
}

impl Eq for AsciiHeader {}

impl FromStr for AsciiHeader {
    type Err = VoltcapError;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

impl fmt::Display for AsciiHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw())
    }
}
