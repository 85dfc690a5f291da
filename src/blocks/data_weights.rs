//! Lock-step access to a data stream and its weights stream

use std::path::PathBuf;

use log::warn;

use crate::error::{Result, VoltcapError};
use crate::header::{keys, AsciiHeader};
use crate::layout::HeapLayout;

use super::block::{Block, BlockLoader, BlockStream};
use super::config::StreamConfig;
use super::file_loader::FileBlockLoader;
use super::file_producer::FileBlockProducer;

/// Paired zero-copy file streams
pub type DataWeightsBlockProducer = DataWeightsStream<FileBlockProducer, FileBlockProducer>;

/// Paired copying file streams
pub type DataWeightsBlockLoader = DataWeightsStream<FileBlockLoader, FileBlockLoader>;

/// One step of a paired stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataWeightsBlock<'a> {
    pub data: Block<'a>,
    pub weights: Block<'a>,
}

impl<'a> DataWeightsBlock<'a> {
    pub fn end() -> Self {
        Self {
            data: Block::end(),
            weights: Block::end(),
        }
    }

    pub fn is_end(&self) -> bool {
        self.data.is_end() && self.weights.is_end()
    }
}

/// Composes a data stream and a weights stream that advance together
///
/// The header pair is validated through [`HeapLayout`] as soon as both
/// streams are present. Every operation fails with a state error until
/// then.
#[derive(Debug)]
pub struct DataWeightsStream<D, W> {
    data: Option<D>,
    weights: Option<W>,
    layout: Option<HeapLayout>,
    /// Set when a step fails after the streams have moved apart
    failed: bool,
}

impl<D, W> Default for DataWeightsStream<D, W> {
    fn default() -> Self {
        Self {
            data: None,
            weights: None,
            layout: None,
            failed: false,
        }
    }
}

impl<D: BlockStream, W: BlockStream> DataWeightsStream<D, W> {
    /// Create a pair with neither stream set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pair from two open streams
    pub fn from_streams(data: D, weights: W) -> Result<Self> {
        let layout = HeapLayout::configure(data.header(), weights.header())?;
        Ok(Self {
            data: Some(data),
            weights: Some(weights),
            layout: Some(layout),
            failed: false,
        })
    }

    /// Install the data stream, replacing any previous one
    ///
    /// On failure the pair keeps its previous streams.
    pub fn set_data_stream(&mut self, data: D) -> Result<()> {
        let layout = match &self.weights {
            Some(weights) => Some(HeapLayout::configure(data.header(), weights.header())?),
            None => None,
        };
        self.data = Some(data);
        self.layout = layout;
        self.failed = false;
        Ok(())
    }

    /// Install the weights stream, replacing any previous one
    ///
    /// On failure the pair keeps its previous streams.
    pub fn set_weights_stream(&mut self, weights: W) -> Result<()> {
        let layout = match &self.data {
            Some(data) => Some(HeapLayout::configure(data.header(), weights.header())?),
            None => None,
        };
        self.weights = Some(weights);
        self.layout = layout;
        self.failed = false;
        Ok(())
    }

    pub fn is_initialised(&self) -> bool {
        self.layout.is_some()
    }

    /// Whether a previous step failed; cleared by installing a new stream
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    fn parts(&self) -> Result<(&D, &W, &HeapLayout)> {
        match (&self.data, &self.weights, &self.layout) {
            (Some(data), Some(weights), Some(layout)) => Ok((data, weights, layout)),
            _ => Err(not_initialised()),
        }
    }

    pub fn data_stream(&self) -> Result<&D> {
        self.parts().map(|(data, _, _)| data)
    }

    pub fn weights_stream(&self) -> Result<&W> {
        self.parts().map(|(_, weights, _)| weights)
    }

    pub fn data_header(&self) -> Result<&AsciiHeader> {
        self.data_stream().map(|data| data.header())
    }

    pub fn weights_header(&self) -> Result<&AsciiHeader> {
        self.weights_stream().map(|weights| weights.header())
    }

    pub fn heap_layout(&self) -> Result<&HeapLayout> {
        self.parts().map(|(_, _, layout)| layout)
    }

    /// Advance both streams by one block
    ///
    /// Both blocks must end together and hold the same whole number of
    /// heaps starting at the same heap; anything else is a validation
    /// error. Both streams have advanced by the time an error is raised, so
    /// after any error the pair is marked failed and every later call is a
    /// state error until a stream is replaced.
    pub fn next_block(&mut self) -> Result<DataWeightsBlock<'_>> {
        if self.failed {
            return Err(VoltcapError::state("data and weights streams failed on a previous block"));
        }
        let Self { data, weights, layout, failed } = self;
        let (Some(data), Some(weights), Some(layout)) = (data.as_mut(), weights.as_mut(), layout.as_ref()) else {
            return Err(not_initialised());
        };

        match next_pair(data, weights, layout) {
            Ok(block) => Ok(block),
            Err(e) => {
                *failed = true;
                Err(e)
            }
        }
    }
}

fn next_pair<'a, D: BlockStream, W: BlockStream>(
    data: &'a mut D,
    weights: &'a mut W,
    layout: &HeapLayout,
) -> Result<DataWeightsBlock<'a>> {
    let data_block = data.next_block()?;
    let weights_block = weights.next_block()?;

    match (data_block.is_end(), weights_block.is_end()) {
        (true, true) => return Ok(DataWeightsBlock::end()),
        (false, false) => {}
        _ => {
            warn!(
                "paired streams ended apart: data block {} B, weights block {} B",
                data_block.len(),
                weights_block.len()
            );
            return Err(VoltcapError::validation(
                "stream length",
                "data and weights streams hold different numbers of heaps",
            ));
        }
    }

    layout.heaps_in(data_block.len(), weights_block.len())?;
    let data_heap = data_block.obs_offset() / layout.data_heap_stride() as u64;
    let weights_heap = weights_block.obs_offset() / layout.weights_heap_stride() as u64;
    if data_heap != weights_heap {
        warn!("data block starts at heap {}, weights block at heap {}", data_heap, weights_heap);
        return Err(VoltcapError::inconsistent(keys::OBS_OFFSET));
    }

    Ok(DataWeightsBlock {
        data: data_block,
        weights: weights_block,
    })
}

impl<D: BlockLoader, W: BlockLoader> DataWeightsStream<D, W> {
    /// Size both loaders so that every block holds `heaps` whole heaps
    pub fn set_heaps_per_block(&mut self, heaps: usize) -> Result<()> {
        if heaps == 0 {
            return Err(VoltcapError::validation("heaps_per_block", "must be greater than 0"));
        }
        let Self { data, weights, layout, .. } = self;
        let (Some(data), Some(weights), Some(layout)) = (data.as_mut(), weights.as_mut(), layout.as_ref()) else {
            return Err(not_initialised());
        };
        data.set_block_size(heaps * layout.data_heap_stride())?;
        weights.set_block_size(heaps * layout.weights_heap_stride())
    }
}

impl DataWeightsStream<FileBlockProducer, FileBlockProducer> {
    /// Map a data file and a weights file
    pub fn open(data_path: impl Into<PathBuf>, weights_path: impl Into<PathBuf>) -> Result<Self> {
        let data = FileBlockProducer::open(data_path)?;
        let weights = FileBlockProducer::open(weights_path)?;
        Self::from_streams(data, weights)
    }
}

impl DataWeightsStream<FileBlockLoader, FileBlockLoader> {
    /// Open a data file and a weights file for copying access, `heaps`
    /// heaps per block
    pub fn open(
        data_path: impl Into<PathBuf>,
        weights_path: impl Into<PathBuf>,
        heaps: usize,
    ) -> Result<Self> {
        let data = FileBlockLoader::with_config(StreamConfig::new(data_path))?;
        let weights = FileBlockLoader::with_config(StreamConfig::new(weights_path))?;
        let mut pair = Self::from_streams(data, weights)?;
        pair.set_heaps_per_block(heaps)?;
        Ok(pair)
    }
}

fn not_initialised() -> VoltcapError {
    VoltcapError::state("data and weights streams must both be set")
}
