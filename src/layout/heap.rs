//! Heap geometry shared by a data stream and its weights stream
//!
//! A heap holds every channel for one packet's worth of time samples. The
//! data stream stores the sample data of each packet back to back; the
//! weights stream stores, per packet, the scale factor followed by the
//! weights. Both streams must describe the same channel and packet
//! grouping, which [`HeapLayout::configure`] checks before computing any
//! strides.

use log::debug;
use serde::Serialize;

use crate::config::SUPPORTED_NBITS;
use crate::error::{Result, VoltcapError};
use crate::header::{keys, AsciiHeader};

use super::packet::{checked_product, PacketLayout, UdpPacketLayout};

/// Fields that must be identical in the data and weights headers
const SHARED_FIELDS: [&str; 4] = [keys::NCHAN, keys::UDP_NSAMP, keys::UDP_NCHAN, keys::WT_NSAMP];

/// Byte strides and offsets of packets within the data and weights streams
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeapLayout {
    nchan: usize,
    nbit: usize,
    weights_nbit: usize,
    packets_per_heap: usize,
    packet: UdpPacketLayout,
    data_packet_stride: usize,
    weights_packet_stride: usize,
    data_heap_stride: usize,
    weights_heap_stride: usize,
}

impl HeapLayout {
    /// Validate a data/weights header pair and compute the heap geometry
    pub fn configure(data: &AsciiHeader, weights: &AsciiHeader) -> Result<Self> {
        for field in SHARED_FIELDS {
            if data.get_u32(field)? != weights.get_u32(field)? {
                return Err(VoltcapError::inconsistent(field));
            }
        }

        expect_value(data, keys::NDIM, 2)?;
        expect_value(data, keys::NPOL, 2)?;
        let nbit = data.get_u32(keys::NBIT)?;
        if !SUPPORTED_NBITS.contains(&nbit) {
            return Err(VoltcapError::validation(
                keys::NBIT,
                format!("data NBIT {} not one of {:?}", nbit, SUPPORTED_NBITS),
            ));
        }

        let nchan = nonzero(data, keys::NCHAN)?;
        let nsamp_per_packet = nonzero(data, keys::UDP_NSAMP)?;
        let nchan_per_packet = nonzero(data, keys::UDP_NCHAN)?;
        let nsamp_per_weight = nonzero(data, keys::WT_NSAMP)?;

        if nchan % nchan_per_packet != 0 {
            return Err(VoltcapError::validation(
                keys::NCHAN,
                format!("NCHAN {} is not a multiple of UDP_NCHAN {}", nchan, nchan_per_packet),
            ));
        }
        if nsamp_per_packet % nsamp_per_weight != 0 {
            return Err(VoltcapError::validation(
                keys::UDP_NSAMP,
                format!("UDP_NSAMP {} is not a multiple of WT_NSAMP {}", nsamp_per_packet, nsamp_per_weight),
            ));
        }

        expect_value(weights, keys::NDIM, 1)?;
        expect_value(weights, keys::NPOL, 1)?;
        let weights_nbit = nonzero(weights, keys::NBIT)?;

        let packet = UdpPacketLayout::new(
            0,
            nchan_per_packet,
            nsamp_per_packet,
            nsamp_per_weight,
            nbit as usize,
            weights_nbit,
        )?;

        let packets_per_heap = nchan / nchan_per_packet;
        let data_packet_stride = packet.data_size();
        let weights_packet_stride = packet.scales_size() + packet.weights_size();
        let data_heap_stride = checked_product(keys::NCHAN, &[packets_per_heap, data_packet_stride])?;
        let weights_heap_stride = checked_product(keys::NCHAN, &[packets_per_heap, weights_packet_stride])?;

        let layout = Self {
            nchan,
            nbit: nbit as usize,
            weights_nbit,
            packets_per_heap,
            packet,
            data_packet_stride,
            weights_packet_stride,
            data_heap_stride,
            weights_heap_stride,
        };
        debug!(
            "heap layout: {} packets/heap, data stride {} B, weights stride {} B",
            layout.packets_per_heap, layout.data_heap_stride, layout.weights_heap_stride
        );
        Ok(layout)
    }

    pub fn nchan(&self) -> usize {
        self.nchan
    }

    /// Bits per real sample value in the data stream
    pub fn nbit(&self) -> usize {
        self.nbit
    }

    /// Bits per weight in the weights stream
    pub fn weights_nbit(&self) -> usize {
        self.weights_nbit
    }

    pub fn packets_per_heap(&self) -> usize {
        self.packets_per_heap
    }

    pub fn nchan_per_packet(&self) -> usize {
        self.packet.channels_per_packet()
    }

    pub fn nsamp_per_packet(&self) -> usize {
        self.packet.samples_per_packet()
    }

    pub fn nsamp_per_weight(&self) -> usize {
        self.packet.samples_per_weight()
    }

    /// Combined packet view: scales, then weights, then data
    pub fn packet_layout(&self) -> &UdpPacketLayout {
        &self.packet
    }

    /// Offset of the scale factor within a packet's weights block
    pub fn packet_scales_offset(&self) -> usize {
        0
    }

    pub fn packet_scales_size(&self) -> usize {
        self.packet.scales_size()
    }

    /// Offset of the weights within a packet's weights block
    pub fn packet_weights_offset(&self) -> usize {
        self.packet.scales_size()
    }

    pub fn packet_weights_size(&self) -> usize {
        self.packet.weights_size()
    }

    /// Offset of the samples within a packet's data block
    pub fn packet_data_offset(&self) -> usize {
        0
    }

    pub fn packet_data_size(&self) -> usize {
        self.packet.data_size()
    }

    pub fn data_packet_stride(&self) -> usize {
        self.data_packet_stride
    }

    /// Scales plus weights bytes per packet
    pub fn weights_packet_stride(&self) -> usize {
        self.weights_packet_stride
    }

    pub fn data_heap_stride(&self) -> usize {
        self.data_heap_stride
    }

    pub fn weights_heap_stride(&self) -> usize {
        self.weights_heap_stride
    }

    /// Offset of packet `index` within a data heap
    pub fn data_packet_offset(&self, index: usize) -> usize {
        index * self.data_packet_stride
    }

    /// Offset of packet `index` within a weights heap
    pub fn weights_packet_offset(&self, index: usize) -> usize {
        index * self.weights_packet_stride
    }

    /// Number of heaps held by a pair of data and weights byte counts
    ///
    /// Both counts must be whole heaps and describe the same number of them.
    pub fn heaps_in(&self, data_len: usize, weights_len: usize) -> Result<usize> {
        if data_len % self.data_heap_stride != 0 {
            return Err(VoltcapError::validation(
                "data",
                format!("{} bytes is not a whole number of {} byte heaps", data_len, self.data_heap_stride),
            ));
        }
        if weights_len % self.weights_heap_stride != 0 {
            return Err(VoltcapError::validation(
                "weights",
                format!("{} bytes is not a whole number of {} byte heaps", weights_len, self.weights_heap_stride),
            ));
        }
        let data_heaps = data_len / self.data_heap_stride;
        let weights_heaps = weights_len / self.weights_heap_stride;
        if data_heaps != weights_heaps {
            return Err(VoltcapError::validation(
                "stream length",
                format!("data holds {} heaps but weights hold {}", data_heaps, weights_heaps),
            ));
        }
        Ok(data_heaps)
    }
}

fn expect_value(header: &AsciiHeader, key: &str, expected: u32) -> Result<()> {
    let value = header.get_u32(key)?;
    if value != expected {
        return Err(VoltcapError::validation(key, format!("expected {}, found {}", expected, value)));
    }
    Ok(())
}

fn nonzero(header: &AsciiHeader, key: &str) -> Result<usize> {
    match header.get_u32(key)? {
        0 => Err(VoltcapError::validation(key, "must be non-zero")),
        value => Ok(value as usize),
    }
}
