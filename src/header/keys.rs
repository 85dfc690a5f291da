//! Header field names read and written by the data plane

/// Size in bytes of the header block that precedes the payload
pub const HDR_SIZE: &str = "HDR_SIZE";
/// Byte offset of the first payload byte within the observation
pub const OBS_OFFSET: &str = "OBS_OFFSET";
/// Number of frequency channels in the stream
pub const NCHAN: &str = "NCHAN";
/// Bits per sample
pub const NBIT: &str = "NBIT";
/// Number of polarisations
pub const NPOL: &str = "NPOL";
/// Number of dimensions per sample (2 for complex)
pub const NDIM: &str = "NDIM";
/// Time samples per UDP packet
pub const UDP_NSAMP: &str = "UDP_NSAMP";
/// Channels per UDP packet
pub const UDP_NCHAN: &str = "UDP_NCHAN";
/// Time samples sharing one weight
pub const WT_NSAMP: &str = "WT_NSAMP";
/// Observation start time, used to seed integrity generators
pub const UTC_START: &str = "UTC_START";
/// Explicit seed for integrity generators
pub const SEED: &str = "SEED";
/// Period in samples of the synthetic sine tone
pub const SINE_PERIOD: &str = "SINE_PERIOD";
