//! Zero-copy access to a captured file through a read-only mapping

use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use memmap2::{Mmap, MmapOptions};

use crate::error::{Result, VoltcapError};
use crate::header::{keys, AsciiHeader};

use super::block::{AccessMode, Block, BlockProducer, BlockStream};
use super::config::StreamConfig;

/// Maps the payload of one captured file and hands it out as a single block
///
/// The first call to `next_block` returns the entire payload; every later
/// call returns the end marker. The file and its mapping are released when
/// the producer is dropped.
#[derive(Debug)]
pub struct FileBlockProducer {
    /// Path of the captured file
    path: PathBuf,
    /// Header read from the start of the file
    header: AsciiHeader,
    /// Observation offset of the first payload byte
    obs_offset: u64,
    /// Payload mapping; `None` when the file holds only a header
    mmap: Option<Mmap>,
    /// Backing file, held for the lifetime of the mapping
    _file: File,
    /// Whether the payload block has been handed out
    delivered: bool,
}

impl FileBlockProducer {
    /// Open a captured file with default settings
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(StreamConfig::new(path))
    }

    /// Open a captured file
    pub fn with_config(config: StreamConfig) -> Result<Self> {
        config.validate()?;

        let path = config.path;
        let mut file = File::open(&path)
            .map_err(|e| VoltcapError::from_io(e, &format!("Failed to open {}", path.display())))?;
        let file_size = file
            .metadata()
            .map_err(|e| VoltcapError::from_io(e, &format!("Failed to stat {}", path.display())))?
            .len();
        if file_size == 0 {
            return Err(VoltcapError::io(format!("{} is empty", path.display())));
        }

        let (header, _) = AsciiHeader::read_prefixed(&mut file, config.header_size_hint)?;
        let hdr_size = header.header_size()? as u64;
        let obs_offset = header.get_u64(keys::OBS_OFFSET)?;
        let payload_size = usize::try_from(file_size - hdr_size)
            .map_err(|_| VoltcapError::io(format!("{} is too large to map", path.display())))?;

        let mmap = Self::create_mapping(&file, hdr_size, payload_size)?;
        debug!(
            "mapped {}: header {} B, payload {} B, OBS_OFFSET {}",
            path.display(),
            hdr_size,
            payload_size,
            obs_offset
        );

        Ok(Self {
            path,
            header,
            obs_offset,
            mmap,
            _file: file,
            delivered: false,
        })
    }

    /// Map `len` bytes of the file starting at `offset`
    fn create_mapping(file: &File, offset: u64, len: usize) -> Result<Option<Mmap>> {
        if len == 0 {
            return Ok(None);
        }
        // SAFETY: the mapping is read-only and lives no longer than the file
        // handle held alongside it.
        let mmap = unsafe { MmapOptions::new().offset(offset).len(len).map(file) }
            .map_err(|e| VoltcapError::from_io(e, "Failed to create memory mapping"))?;
        Ok(Some(mmap))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn obs_offset(&self) -> u64 {
        self.obs_offset
    }

    /// The mapped payload, independent of the block cursor
    pub fn payload(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }
}

impl BlockStream for FileBlockProducer {
    fn header(&self) -> &AsciiHeader {
        &self.header
    }

    fn next_block(&mut self) -> Result<Block<'_>> {
        if self.delivered {
            return Ok(Block::end());
        }
        self.delivered = true;

        match &self.mmap {
            Some(mmap) => {
                trace!("{}: block of {} B at {}", self.path.display(), mmap.len(), self.obs_offset);
                Ok(Block::new(&mmap[..], self.obs_offset))
            }
            None => Ok(Block::end()),
        }
    }

    fn access_mode(&self) -> AccessMode {
        AccessMode::ZeroCopy
    }
}

impl BlockProducer for FileBlockProducer {
    fn payload_size(&self) -> usize {
        self.mmap.as_ref().map_or(0, |m| m.len())
    }
}
