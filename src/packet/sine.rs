//! Packets carrying a complex sine tone

use std::f64::consts::TAU;

use crate::config::SUPPORTED_NBITS;
use crate::endian::WireOrder;
use crate::error::{Result, VoltcapError};
use crate::header::{keys, AsciiHeader};
use crate::layout::PacketLayout;

use super::signal::SignalModel;

/// Samples per cycle when the header does not set `SINE_PERIOD`
pub const DEFAULT_SINE_PERIOD: u32 = 64;

/// Weight byte written for every weight: full weight
const FULL_WEIGHT: u8 = 0xff;

/// Fills data with a complex tone, scales with `1.0` and weights with the
/// maximum weight
///
/// Data is ordered channel, sample, polarisation, dimension and written as
/// signed big-endian integers of `NBIT` bits. Both polarisations carry the
/// same tone; sample time continues from one packet to the next.
#[derive(Debug, Clone)]
pub struct SineWave {
    nbit: usize,
    period: u32,
    nsamp_per_packet: usize,
    amplitude: f64,
}

impl Default for SineWave {
    fn default() -> Self {
        Self {
            nbit: 8,
            period: DEFAULT_SINE_PERIOD,
            nsamp_per_packet: 1,
            amplitude: amplitude_for(8),
        }
    }
}

impl SineWave {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the `index`th number in packet `packet`'s data
    fn value(&self, packet: u64, index: usize) -> i64 {
        let dim = index % 2;
        let sample = (index / 4) % self.nsamp_per_packet;
        let t = packet * self.nsamp_per_packet as u64 + sample as u64;
        let phase = TAU * (t % self.period as u64) as f64 / self.period as f64;
        let component = if dim == 0 { phase.cos() } else { phase.sin() };
        (self.amplitude * component).round() as i64
    }

    fn bytes_per_value(&self) -> usize {
        self.nbit / 8
    }

    fn encode(&self, value: i64, out: &mut [u8]) {
        match self.nbit {
            8 => out[0] = value as i8 as u8,
            16 => (value as i16 as u16).write_wire(out),
            _ => (value as i32 as u32).write_wire(out),
        }
    }

    fn decode(&self, bytes: &[u8]) -> i64 {
        match self.nbit {
            8 => bytes[0] as i8 as i64,
            16 => u16::read_wire(bytes) as i16 as i64,
            _ => u32::read_wire(bytes) as i32 as i64,
        }
    }
}

fn amplitude_for(nbit: usize) -> f64 {
    // half of full scale leaves headroom for rounding
    ((1u64 << (nbit - 1)) - 1) as f64 / 2.0
}

impl SignalModel for SineWave {
    fn name(&self) -> &'static str {
        "sine"
    }

    fn configure(&mut self, header: &AsciiHeader, layout: &dyn PacketLayout) -> Result<()> {
        let nbit = header.get_u32(keys::NBIT)?;
        if !SUPPORTED_NBITS.contains(&nbit) {
            return Err(VoltcapError::validation(keys::NBIT, format!("unsupported NBIT {}", nbit)));
        }
        let period = if header.has(keys::SINE_PERIOD) {
            header.get_u32(keys::SINE_PERIOD)?
        } else {
            DEFAULT_SINE_PERIOD
        };
        if period == 0 {
            return Err(VoltcapError::validation(keys::SINE_PERIOD, "must be non-zero"));
        }
        if layout.samples_per_packet() == 0 {
            return Err(VoltcapError::validation(keys::UDP_NSAMP, "must be non-zero"));
        }

        *self = Self {
            nbit: nbit as usize,
            period,
            nsamp_per_packet: layout.samples_per_packet(),
            amplitude: amplitude_for(nbit as usize),
        };
        Ok(())
    }

    fn fill_scales(&mut self, _packet: u64, buf: &mut [u8]) {
        for scale in buf.chunks_exact_mut(4) {
            1.0f32.to_bits().write_wire(scale);
        }
    }

    fn fill_weights(&mut self, _packet: u64, buf: &mut [u8]) {
        buf.fill(FULL_WEIGHT);
    }

    fn fill_data(&mut self, packet: u64, buf: &mut [u8]) {
        let width = self.bytes_per_value();
        for (index, out) in buf.chunks_exact_mut(width).enumerate() {
            let value = self.value(packet, index);
            self.encode(value, out);
        }
    }

    fn test_scales(&mut self, _packet: u64, buf: &[u8]) -> bool {
        buf.len() % 4 == 0 && buf.chunks_exact(4).all(|scale| f32::from_bits(u32::read_wire(scale)) == 1.0)
    }

    fn test_weights(&mut self, _packet: u64, buf: &[u8]) -> bool {
        buf.iter().all(|&b| b == FULL_WEIGHT)
    }

    fn test_data(&mut self, packet: u64, buf: &[u8]) -> bool {
        let width = self.bytes_per_value();
        buf.len() % width == 0
            && buf
                .chunks_exact(width)
                .enumerate()
                .all(|(index, bytes)| self.decode(bytes) == self.value(packet, index))
    }
}
