//! Block views and the stream capabilities that hand them out

use crate::error::Result;
use crate::header::AsciiHeader;

/// A borrowed view of stream bytes
///
/// A block never owns its bytes. It borrows the stream that returned it, so
/// the next call that advances the stream cannot be made while the block is
/// still in use. The empty block marks the end of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    data: &'a [u8],
    obs_offset: u64,
}

impl<'a> Block<'a> {
    pub fn new(data: &'a [u8], obs_offset: u64) -> Self {
        Self { data, obs_offset }
    }

    /// The end-of-data marker
    pub fn end() -> Self {
        Self {
            data: &[],
            obs_offset: 0,
        }
    }

    pub fn is_end(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte offset of the first byte of this block within the observation
    pub fn obs_offset(&self) -> u64 {
        self.obs_offset
    }
}

/// How a stream delivers its bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Blocks point directly into a mapping of the source
    ZeroCopy,
    /// Blocks point into a private buffer refilled on every call
    Copying,
}

/// Sequential access to one header-described byte stream
pub trait BlockStream {
    /// Header describing the stream
    fn header(&self) -> &AsciiHeader;

    /// Advance to the next block; returns the end marker once exhausted
    fn next_block(&mut self) -> Result<Block<'_>>;

    fn access_mode(&self) -> AccessMode;
}

/// A stream whose blocks are views into a backing store, without copying
pub trait BlockProducer: BlockStream {
    /// Total payload bytes available from the backing store
    fn payload_size(&self) -> usize;
}

/// A stream that copies each block into a buffer it owns
pub trait BlockLoader: BlockStream {
    /// Maximum bytes returned per block
    fn block_size(&self) -> usize;

    /// Change the maximum bytes returned by subsequent blocks
    fn set_block_size(&mut self, block_size: usize) -> Result<()>;
}

impl<S: BlockStream + ?Sized> BlockStream for Box<S> {
    fn header(&self) -> &AsciiHeader {
        (**self).header()
    }

    fn next_block(&mut self) -> Result<Block<'_>> {
        (**self).next_block()
    }

    fn access_mode(&self) -> AccessMode {
        (**self).access_mode()
    }
}
