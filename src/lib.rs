//! # voltcap - Data-plane layout and integrity checks for voltage capture
//!
//! voltcap describes how digitiser heaps of sample data and weights are laid
//! out in captured byte streams, gives sequential access to those streams
//! from files, and generates reproducible test content for checking that
//! data crosses the pipeline without corruption or reordering.
//!
//! ## Features
//!
//! - **Heap layout**: packet strides and offsets for data, scales and weights,
//!   validated across the data and weights headers
//! - **Block streams**: zero-copy mapped producers and copying loaders, alone
//!   or paired as data + weights
//! - **Packet generator**: fills and checks packets through swappable signal
//!   models
//! - **Random sequences**: seekable byte generator for spot-checking any range
//!   of a capture
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌─────────────────────┐
//! │ AsciiHeader  │───▶│  HeapLayout  │───▶│  PacketGenerator    │
//! │ (data, wts)  │    │ PacketLayout │    │  + SignalModel      │
//! └──────────────┘    └──────────────┘    └─────────────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────────────────────────────┐  ┌────────────────────┐
//! │ BlockStream: FileBlockProducer      │  │  RandomSequence    │
//! │              FileBlockLoader        │  │  (seekable)        │
//! │ DataWeightsStream, FileSegmentProd. │  └────────────────────┘
//! └─────────────────────────────────────┘
//! ```

pub mod blocks;
pub mod endian;
pub mod error;
pub mod header;
pub mod layout;
pub mod packet;
pub mod random;

mod utils;

// Main API re-exports
pub use blocks::{
    AccessMode, Block, BlockLoader, BlockProducer, BlockStream, CaptureFileWriter, DataWeightsBlock,
    DataWeightsBlockLoader, DataWeightsBlockProducer, DataWeightsStream, FileBlockLoader, FileBlockProducer,
    FileSegmentProducer, ReaderBlockLoader, Segment, StreamConfig,
};
pub use endian::WireOrder;
pub use error::{Result, VoltcapError};
pub use header::AsciiHeader;
pub use layout::{HeapLayout, PacketLayout, UdpPacketLayout};
pub use packet::{PacketGenerator, RandomSignal, SignalModel, SineWave};
pub use random::RandomSequence;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration constants
pub mod config {
    /// Conventional size of a capture file header (4KB)
    pub const DEFAULT_HEADER_SIZE: usize = 4096;

    /// Default block size for copying loaders (1MB)
    pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

    /// Bytes of scale factor per packet (one `f32`)
    pub const SCALES_SIZE: usize = std::mem::size_of::<f32>();

    /// Sample widths supported for the data stream
    pub const SUPPORTED_NBITS: [u32; 3] = [8, 16, 32];
}
