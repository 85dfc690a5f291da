//! Copying block access for sources that cannot be mapped

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use log::{debug, trace};

use crate::error::{Result, VoltcapError};
use crate::header::{keys, AsciiHeader};
use crate::utils::read_full;

use super::block::{AccessMode, Block, BlockLoader, BlockStream};
use super::config::StreamConfig;

/// Copying loader over a captured file
pub type FileBlockLoader = ReaderBlockLoader<File>;

/// Reads a header-prefixed byte stream into a private buffer, one block
/// at a time
///
/// Each block holds at most `block_size` bytes; the final block may be
/// shorter. Block contents are overwritten by the next call.
#[derive(Debug)]
pub struct ReaderBlockLoader<R> {
    /// Description of the source for log messages
    source: String,
    reader: R,
    header: AsciiHeader,
    /// Observation offset of the first payload byte
    base_obs_offset: u64,
    /// Payload bytes handed out so far
    delivered: u64,
    /// Payload bytes read while locating the end of the header
    pending: Vec<u8>,
    buffer: Vec<u8>,
    block_size: usize,
}

impl<R: Read> ReaderBlockLoader<R> {
    /// Read the header from `reader` and prepare to load blocks
    pub fn from_reader(
        mut reader: R,
        source: impl Into<String>,
        block_size: usize,
        header_size_hint: usize,
    ) -> Result<Self> {
        if block_size == 0 {
            return Err(VoltcapError::validation("block_size", "Block size must be greater than 0"));
        }
        let source = source.into();
        let (header, pending) = AsciiHeader::read_prefixed(&mut reader, header_size_hint)?;
        let base_obs_offset = header.get_u64(keys::OBS_OFFSET)?;
        debug!("loading {} in blocks of {} B, OBS_OFFSET {}", source, block_size, base_obs_offset);

        Ok(Self {
            source,
            reader,
            header,
            base_obs_offset,
            delivered: 0,
            pending,
            buffer: vec![0; block_size],
            block_size,
        })
    }

    /// Payload bytes handed out so far
    pub fn bytes_delivered(&self) -> u64 {
        self.delivered
    }

    /// Copy the next block into the buffer, returning its length
    fn fill_buffer(&mut self) -> Result<usize> {
        let from_pending = self.pending.len().min(self.block_size);
        self.buffer[..from_pending].copy_from_slice(&self.pending[..from_pending]);
        self.pending.drain(..from_pending);

        let read = read_full(&mut self.reader, &mut self.buffer[from_pending..])
            .map_err(|e| VoltcapError::from_io(e, &format!("Failed to read {}", self.source)))?;
        Ok(from_pending + read)
    }
}

impl ReaderBlockLoader<File> {
    /// Open a captured file with default settings
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(StreamConfig::new(path))
    }

    /// Open a captured file
    pub fn with_config(config: StreamConfig) -> Result<Self> {
        config.validate()?;

        let path = config.path;
        let file = File::open(&path)
            .map_err(|e| VoltcapError::from_io(e, &format!("Failed to open {}", path.display())))?;
        let file_size = file
            .metadata()
            .map_err(|e| VoltcapError::from_io(e, &format!("Failed to stat {}", path.display())))?
            .len();
        if file_size == 0 {
            return Err(VoltcapError::io(format!("{} is empty", path.display())));
        }

        Self::from_reader(file, path.display().to_string(), config.block_size, config.header_size_hint)
    }
}

impl<R: Read> BlockStream for ReaderBlockLoader<R> {
    fn header(&self) -> &AsciiHeader {
        &self.header
    }

    fn next_block(&mut self) -> Result<Block<'_>> {
        let filled = self.fill_buffer()?;
        if filled == 0 {
            return Ok(Block::end());
        }

        let obs_offset = self.base_obs_offset + self.delivered;
        self.delivered += filled as u64;
        trace!("{}: block of {} B at {}", self.source, filled, obs_offset);
        Ok(Block::new(&self.buffer[..filled], obs_offset))
    }

    fn access_mode(&self) -> AccessMode {
        AccessMode::Copying
    }
}

impl<R: Read> BlockLoader for ReaderBlockLoader<R> {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn set_block_size(&mut self, block_size: usize) -> Result<()> {
        if block_size == 0 {
            return Err(VoltcapError::validation("block_size", "Block size must be greater than 0"));
        }
        self.block_size = block_size;
        self.buffer.resize(block_size, 0);
        Ok(())
    }
}
