//! Writing captured files: a padded header followed by payload blocks

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Result, VoltcapError};
use crate::header::AsciiHeader;

/// Creates a captured file readable by the block producers and loaders
#[derive(Debug)]
pub struct CaptureFileWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    payload_written: u64,
}

impl CaptureFileWriter {
    /// Create `path`, truncating any existing file, and write the header
    /// padded to its `HDR_SIZE`
    pub fn create(path: impl Into<PathBuf>, header: &AsciiHeader) -> Result<Self> {
        let path = path.into();
        let header_bytes = header.to_padded_bytes()?;
        let file = File::create(&path)
            .map_err(|e| VoltcapError::from_io(e, &format!("Failed to create {}", path.display())))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(&header_bytes)
            .map_err(|e| VoltcapError::from_io(e, "Failed to write header"))?;
        debug!("created {} with {} B header", path.display(), header_bytes.len());

        Ok(Self {
            path,
            writer,
            payload_written: 0,
        })
    }

    /// Append payload bytes
    pub fn write_block(&mut self, data: &[u8]) -> Result<()> {
        self.writer
            .write_all(data)
            .map_err(|e| VoltcapError::from_io(e, "Failed to write payload"))?;
        self.payload_written += data.len() as u64;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn payload_written(&self) -> u64 {
        self.payload_written
    }

    /// Flush buffered bytes to disk and close the file
    pub fn finish(mut self) -> Result<u64> {
        self.writer
            .flush()
            .map_err(|e| VoltcapError::from_io(e, "Failed to flush captured file"))?;
        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| VoltcapError::from_io(e, "Failed to sync captured file"))?;
        Ok(self.payload_written)
    }
}
