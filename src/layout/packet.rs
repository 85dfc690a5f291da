//! Geometry of a single UDP packet

use serde::Serialize;

use crate::config::SCALES_SIZE;
use crate::error::{Result, VoltcapError};

/// Byte geometry of one packet's scales, weights and data regions
///
/// Implemented once per digitiser packet format. Offsets are relative to
/// the first byte of the packet.
pub trait PacketLayout: std::fmt::Debug {
    /// Frequency channels carried by one packet
    fn channels_per_packet(&self) -> usize;

    /// Time samples carried by one packet
    fn samples_per_packet(&self) -> usize;

    /// Time samples sharing one weight
    fn samples_per_weight(&self) -> usize;

    fn scales_offset(&self) -> usize;
    fn scales_size(&self) -> usize;
    fn weights_offset(&self) -> usize;
    fn weights_size(&self) -> usize;
    fn data_offset(&self) -> usize;
    fn data_size(&self) -> usize;

    /// Total packet size in bytes
    fn packet_size(&self) -> usize {
        let ends = [
            self.scales_offset() + self.scales_size(),
            self.weights_offset() + self.weights_size(),
            self.data_offset() + self.data_size(),
        ];
        ends.into_iter().max().unwrap_or(0)
    }
}

/// A packet made of an optional fixed header, followed by the scale
/// factor, the weights and the sample data, with no padding between them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UdpPacketLayout {
    header_size: usize,
    nchan: usize,
    nsamp: usize,
    nsamp_per_weight: usize,
    scales_size: usize,
    weights_size: usize,
    data_size: usize,
}

impl UdpPacketLayout {
    /// Build a layout from packet geometry
    ///
    /// `data_nbit` is the bits per real sample value; samples are complex
    /// and dual polarisation. `weights_nbit` is the bits per weight.
    pub fn new(
        header_size: usize,
        nchan: usize,
        nsamp: usize,
        nsamp_per_weight: usize,
        data_nbit: usize,
        weights_nbit: usize,
    ) -> Result<Self> {
        if nchan == 0 {
            return Err(VoltcapError::validation("UDP_NCHAN", "channels per packet must be non-zero"));
        }
        if nsamp == 0 {
            return Err(VoltcapError::validation("UDP_NSAMP", "samples per packet must be non-zero"));
        }
        if nsamp_per_weight == 0 || nsamp % nsamp_per_weight != 0 {
            return Err(VoltcapError::validation(
                "WT_NSAMP",
                format!("{} samples per weight does not divide {} samples per packet", nsamp_per_weight, nsamp),
            ));
        }

        let data_bits = checked_product("UDP_NSAMP", &[nsamp, nchan, 2, 2, data_nbit])?;
        if data_nbit == 0 || data_bits % 8 != 0 {
            return Err(VoltcapError::validation("NBIT", format!("unsupported data NBIT {}", data_nbit)));
        }

        let weights_bits = checked_product("UDP_NCHAN", &[nsamp / nsamp_per_weight, nchan, weights_nbit])?;
        if weights_nbit == 0 || weights_bits % 8 != 0 {
            return Err(VoltcapError::validation(
                "NBIT",
                format!("weights of {} bits do not fill whole bytes", weights_nbit),
            ));
        }

        Ok(Self {
            header_size,
            nchan,
            nsamp,
            nsamp_per_weight,
            scales_size: SCALES_SIZE,
            weights_size: weights_bits / 8,
            data_size: data_bits / 8,
        })
    }

    /// Size of the fixed header ahead of the scales
    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// Weights per packet
    pub fn weights_per_packet(&self) -> usize {
        (self.nsamp / self.nsamp_per_weight) * self.nchan
    }
}

/// Multiply sizes derived from header fields, failing on `field` instead of
/// wrapping
pub(crate) fn checked_product(field: &str, factors: &[usize]) -> Result<usize> {
    factors
        .iter()
        .try_fold(1usize, |acc, &factor| acc.checked_mul(factor))
        .ok_or_else(|| VoltcapError::validation(field, format!("size of {:?} overflows", factors)))
}

impl PacketLayout for UdpPacketLayout {
    fn channels_per_packet(&self) -> usize {
        self.nchan
    }

    fn samples_per_packet(&self) -> usize {
        self.nsamp
    }

    fn samples_per_weight(&self) -> usize {
        self.nsamp_per_weight
    }

    fn scales_offset(&self) -> usize {
        self.header_size
    }

    fn scales_size(&self) -> usize {
        self.scales_size
    }

    fn weights_offset(&self) -> usize {
        self.header_size + self.scales_size
    }

    fn weights_size(&self) -> usize {
        self.weights_size
    }

    fn data_offset(&self) -> usize {
        self.header_size + self.scales_size + self.weights_size
    }

    fn data_size(&self) -> usize {
        self.data_size
    }
}
