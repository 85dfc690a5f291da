//! Sequential block access to captured byte streams
//!
//! Streams come in two kinds: producers hand out views straight into a
//! memory mapping, loaders copy into a buffer they own. A data stream and a
//! weights stream can be paired so that both advance together.

pub mod block;
pub mod config;
pub mod data_weights;
pub mod file_loader;
pub mod file_producer;
pub mod segment;
pub mod writer;

pub use block::{AccessMode, Block, BlockLoader, BlockProducer, BlockStream};
pub use config::StreamConfig;
pub use data_weights::{DataWeightsBlock, DataWeightsBlockLoader, DataWeightsBlockProducer, DataWeightsStream};
pub use file_loader::{FileBlockLoader, ReaderBlockLoader};
pub use file_producer::FileBlockProducer;
pub use segment::{FileSegmentProducer, Segment};
pub use writer::CaptureFileWriter;
