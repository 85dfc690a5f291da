//! Zero-copy access to a matched pair of data and weights files

use std::path::PathBuf;

use log::debug;

use crate::error::Result;
use crate::header::AsciiHeader;
use crate::layout::HeapLayout;

use super::block::BlockProducer;
use super::data_weights::{DataWeightsBlock, DataWeightsBlockProducer};
use super::file_producer::FileBlockProducer;

/// The data and weights of the same heaps
pub type Segment<'a> = DataWeightsBlock<'a>;

/// Maps a data file and its weights file and hands both payloads out as
/// one segment
///
/// Construction fails unless both payloads hold the same whole number of
/// heaps.
#[derive(Debug)]
pub struct FileSegmentProducer {
    streams: DataWeightsBlockProducer,
    heaps: usize,
}

impl FileSegmentProducer {
    pub fn open(data_path: impl Into<PathBuf>, weights_path: impl Into<PathBuf>) -> Result<Self> {
        let data = FileBlockProducer::open(data_path)?;
        let weights = FileBlockProducer::open(weights_path)?;
        let streams = DataWeightsBlockProducer::from_streams(data, weights)?;

        let data = streams.data_stream()?;
        let weights = streams.weights_stream()?;
        let heaps = streams
            .heap_layout()?
            .heaps_in(data.payload_size(), weights.payload_size())?;
        debug!(
            "segment of {} heaps from {} and {}",
            heaps,
            data.path().display(),
            weights.path().display()
        );
        Ok(Self { streams, heaps })
    }

    /// Number of heaps in the segment
    pub fn heap_count(&self) -> usize {
        self.heaps
    }

    pub fn data_header(&self) -> Result<&AsciiHeader> {
        self.streams.data_header()
    }

    pub fn weights_header(&self) -> Result<&AsciiHeader> {
        self.streams.weights_header()
    }

    pub fn heap_layout(&self) -> Result<&HeapLayout> {
        self.streams.heap_layout()
    }

    /// The whole segment on the first call, the end marker afterwards
    pub fn next_block(&mut self) -> Result<Segment<'_>> {
        self.streams.next_block()
    }
}
