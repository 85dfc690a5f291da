//! Packets filled from seekable random sequences

use log::warn;

use crate::error::Result;
use crate::header::AsciiHeader;
use crate::layout::PacketLayout;
use crate::random::{seed_from_header, RandomSequence};

use super::signal::SignalModel;

/// One sequence per region, all derived from the header seed
#[derive(Debug, Clone)]
struct Sequences {
    scales: RandomSequence,
    weights: RandomSequence,
    data: RandomSequence,
}

/// Fills every region with pseudo-random bytes
///
/// Region `r` of packet `n` holds bytes `n * len(r)` onwards of that
/// region's sequence, so any packet can be checked without replaying the
/// packets before it. Filling through an unconfigured model is a caller
/// error: it asserts in debug builds and logs a warning in release builds,
/// leaving the buffer untouched. Checks through an unconfigured model
/// always fail.
#[derive(Debug, Clone, Default)]
pub struct RandomSignal {
    sequences: Option<Sequences>,
}

impl RandomSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn fill(sequence: Option<&mut RandomSequence>, packet: u64, buf: &mut [u8]) {
        debug_assert!(sequence.is_some(), "random signal filled before configure");
        match sequence {
            Some(sequence) => {
                sequence.seek(packet * buf.len() as u64);
                sequence.generate(buf);
            }
            None => warn!("random signal filled before configure; packet {} left unwritten", packet),
        }
    }

    fn test(sequence: Option<&mut RandomSequence>, packet: u64, buf: &[u8]) -> bool {
        match sequence {
            Some(sequence) => {
                sequence.seek(packet * buf.len() as u64);
                sequence.validate(buf)
            }
            None => {
                warn!("random signal tested before configure; packet {} rejected", packet);
                false
            }
        }
    }
}

impl SignalModel for RandomSignal {
    fn name(&self) -> &'static str {
        "random"
    }

    fn configure(&mut self, header: &AsciiHeader, _layout: &dyn PacketLayout) -> Result<()> {
        let seed = seed_from_header(header)?;
        self.sequences = Some(Sequences {
            scales: RandomSequence::from_seed_and_stream(seed, "scales"),
            weights: RandomSequence::from_seed_and_stream(seed, "weights"),
            data: RandomSequence::from_seed_and_stream(seed, "data"),
        });
        Ok(())
    }

    fn fill_scales(&mut self, packet: u64, buf: &mut [u8]) {
        Self::fill(self.sequences.as_mut().map(|s| &mut s.scales), packet, buf)
    }

    fn fill_weights(&mut self, packet: u64, buf: &mut [u8]) {
        Self::fill(self.sequences.as_mut().map(|s| &mut s.weights), packet, buf)
    }

    fn fill_data(&mut self, packet: u64, buf: &mut [u8]) {
        Self::fill(self.sequences.as_mut().map(|s| &mut s.data), packet, buf)
    }

    fn test_scales(&mut self, packet: u64, buf: &[u8]) -> bool {
        Self::test(self.sequences.as_mut().map(|s| &mut s.scales), packet, buf)
    }

    fn test_weights(&mut self, packet: u64, buf: &[u8]) -> bool {
        Self::test(self.sequences.as_mut().map(|s| &mut s.weights), packet, buf)
    }

    fn test_data(&mut self, packet: u64, buf: &[u8]) -> bool {
        Self::test(self.sequences.as_mut().map(|s| &mut s.data), packet, buf)
    }
}
