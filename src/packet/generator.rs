//! Filling and checking synthetic packets region by region

use log::debug;

use crate::error::{Result, VoltcapError};
use crate::header::{keys, AsciiHeader};
use crate::layout::PacketLayout;

use super::signal::SignalModel;

/// Offsets derived from the packet layout at configure time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Geometry {
    packets_per_heap: usize,
    /// Scales offset within a packet's weights block
    block_scales_offset: usize,
    /// Weights offset within a packet's weights block
    block_weights_offset: usize,
    /// Scales plus weights bytes per packet
    weights_packet_stride: usize,
    data_packet_stride: usize,
}

/// Writes and checks scales, weights and data of synthetic packets
///
/// The generator owns the geometry: where each region lives, in a whole
/// UDP packet or split across a data block and a weights block. The
/// [`SignalModel`] owns the content. Regions are always handled in the
/// order scales, weights, data.
#[derive(Debug)]
pub struct PacketGenerator<L> {
    layout: L,
    model: Box<dyn SignalModel>,
    geometry: Option<Geometry>,
    packets_filled: u64,
    packets_tested: u64,
}

impl<L: PacketLayout> PacketGenerator<L> {
    pub fn new(layout: L, model: Box<dyn SignalModel>) -> Self {
        Self {
            layout,
            model,
            geometry: None,
            packets_filled: 0,
            packets_tested: 0,
        }
    }

    /// Validate `header` against the layout and prepare the model
    ///
    /// On failure the generator keeps its previous configuration.
    pub fn configure(&mut self, header: &AsciiHeader) -> Result<()> {
        let ndim = header.get_u32(keys::NDIM)?;
        if ndim != 2 {
            return Err(VoltcapError::validation(keys::NDIM, format!("expected 2, found {}", ndim)));
        }
        let npol = header.get_u32(keys::NPOL)?;
        if npol != 2 {
            return Err(VoltcapError::validation(keys::NPOL, format!("expected 2, found {}", npol)));
        }
        let nchan = header.get_u32(keys::NCHAN)? as usize;
        let channels_per_packet = self.layout.channels_per_packet();
        if nchan == 0 || channels_per_packet == 0 || nchan % channels_per_packet != 0 {
            return Err(VoltcapError::validation(
                keys::NCHAN,
                format!("NCHAN {} is not a multiple of {} channels per packet", nchan, channels_per_packet),
            ));
        }

        self.model.configure(header, &self.layout)?;

        let scales_size = self.layout.scales_size();
        let geometry = Geometry {
            packets_per_heap: nchan / channels_per_packet,
            block_scales_offset: 0,
            block_weights_offset: scales_size,
            weights_packet_stride: scales_size + self.layout.weights_size(),
            data_packet_stride: self.layout.data_size(),
        };
        debug!(
            "{} packet generator: {} packets/heap, weights stride {} B, data stride {} B",
            self.model.name(),
            geometry.packets_per_heap,
            geometry.weights_packet_stride,
            geometry.data_packet_stride
        );
        self.geometry = Some(geometry);
        self.reset();
        Ok(())
    }

    /// Swap the content strategy; the generator must be configured again
    pub fn set_model(&mut self, model: Box<dyn SignalModel>) {
        self.model = model;
        self.geometry = None;
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn is_configured(&self) -> bool {
        self.geometry.is_some()
    }

    fn geometry(&self) -> Result<Geometry> {
        self.geometry
            .ok_or_else(|| VoltcapError::state("packet generator used before configure"))
    }

    pub fn packets_per_heap(&self) -> Result<usize> {
        Ok(self.geometry()?.packets_per_heap)
    }

    /// Scales offset within the combined scales and weights block
    pub fn block_scales_offset(&self) -> Result<usize> {
        Ok(self.geometry()?.block_scales_offset)
    }

    /// Weights offset within the combined scales and weights block
    pub fn block_weights_offset(&self) -> Result<usize> {
        Ok(self.geometry()?.block_weights_offset)
    }

    /// Scales plus weights bytes per packet
    pub fn weights_packet_stride(&self) -> Result<usize> {
        Ok(self.geometry()?.weights_packet_stride)
    }

    pub fn data_packet_stride(&self) -> Result<usize> {
        Ok(self.geometry()?.data_packet_stride)
    }

    pub fn packets_filled(&self) -> u64 {
        self.packets_filled
    }

    pub fn packets_tested(&self) -> u64 {
        self.packets_tested
    }

    /// Restart both the fill and the test cursor at packet zero
    pub fn reset(&mut self) {
        self.seek(0);
    }

    /// Move both the fill and the test cursor to packet `packet`
    pub fn seek(&mut self, packet: u64) {
        self.packets_filled = packet;
        self.packets_tested = packet;
    }

    /// Fill one whole packet laid out as described by the layout
    pub fn fill_packet(&mut self, buf: &mut [u8]) -> Result<()> {
        self.geometry()?;
        check_len("packet", buf.len(), self.layout.packet_size())?;

        let (so, ss) = (self.layout.scales_offset(), self.layout.scales_size());
        let (wo, ws) = (self.layout.weights_offset(), self.layout.weights_size());
        let (do_, ds) = (self.layout.data_offset(), self.layout.data_size());
        let packet = self.packets_filled;

        self.model.fill_scales(packet, &mut buf[so..so + ss]);
        self.model.fill_weights(packet, &mut buf[wo..wo + ws]);
        self.model.fill_data(packet, &mut buf[do_..do_ + ds]);
        self.packets_filled += 1;
        Ok(())
    }

    /// Check one whole packet, stopping at the first region that differs
    pub fn test_packet(&mut self, buf: &[u8]) -> Result<bool> {
        self.geometry()?;
        check_len("packet", buf.len(), self.layout.packet_size())?;

        let (so, ss) = (self.layout.scales_offset(), self.layout.scales_size());
        let (wo, ws) = (self.layout.weights_offset(), self.layout.weights_size());
        let (do_, ds) = (self.layout.data_offset(), self.layout.data_size());
        let packet = self.packets_tested;
        self.packets_tested += 1;

        Ok(self.model.test_scales(packet, &buf[so..so + ss])
            && self.model.test_weights(packet, &buf[wo..wo + ws])
            && self.model.test_data(packet, &buf[do_..do_ + ds]))
    }

    /// Fill one packet whose data and weights live in separate streams
    ///
    /// `weights` receives the scales followed by the weights.
    pub fn fill_split_packet(&mut self, data: &mut [u8], weights: &mut [u8]) -> Result<()> {
        let geometry = self.geometry()?;
        check_len("data", data.len(), geometry.data_packet_stride)?;
        check_len("weights", weights.len(), geometry.weights_packet_stride)?;

        let packet = self.packets_filled;
        self.fill_split_at(&geometry, packet, data, weights);
        self.packets_filled += 1;
        Ok(())
    }

    /// Check one packet whose data and weights live in separate streams
    pub fn test_split_packet(&mut self, data: &[u8], weights: &[u8]) -> Result<bool> {
        let geometry = self.geometry()?;
        check_len("data", data.len(), geometry.data_packet_stride)?;
        check_len("weights", weights.len(), geometry.weights_packet_stride)?;

        let packet = self.packets_tested;
        self.packets_tested += 1;
        Ok(self.test_split_at(&geometry, packet, data, weights))
    }

    /// Fill every packet of one heap
    pub fn fill_heap(&mut self, data: &mut [u8], weights: &mut [u8]) -> Result<()> {
        let geometry = self.geometry()?;
        check_len("data", data.len(), geometry.packets_per_heap * geometry.data_packet_stride)?;
        check_len("weights", weights.len(), geometry.packets_per_heap * geometry.weights_packet_stride)?;

        let data_packets = data.chunks_exact_mut(geometry.data_packet_stride);
        let weights_packets = weights.chunks_exact_mut(geometry.weights_packet_stride);
        for (data, weights) in data_packets.zip(weights_packets).take(geometry.packets_per_heap) {
            let packet = self.packets_filled;
            self.fill_split_at(&geometry, packet, data, weights);
            self.packets_filled += 1;
        }
        Ok(())
    }

    /// Check every packet of one heap, stopping at the first that differs
    ///
    /// The test cursor advances by a whole heap either way.
    pub fn test_heap(&mut self, data: &[u8], weights: &[u8]) -> Result<bool> {
        let geometry = self.geometry()?;
        check_len("data", data.len(), geometry.packets_per_heap * geometry.data_packet_stride)?;
        check_len("weights", weights.len(), geometry.packets_per_heap * geometry.weights_packet_stride)?;

        let first = self.packets_tested;
        self.packets_tested += geometry.packets_per_heap as u64;

        let data_packets = data.chunks_exact(geometry.data_packet_stride);
        let weights_packets = weights.chunks_exact(geometry.weights_packet_stride);
        for (index, (data, weights)) in data_packets.zip(weights_packets).take(geometry.packets_per_heap).enumerate() {
            if !self.test_split_at(&geometry, first + index as u64, data, weights) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn fill_split_at(&mut self, geometry: &Geometry, packet: u64, data: &mut [u8], weights: &mut [u8]) {
        let scales = geometry.block_scales_offset..geometry.block_weights_offset;
        let weight_values = geometry.block_weights_offset..geometry.weights_packet_stride;
        self.model.fill_scales(packet, &mut weights[scales]);
        self.model.fill_weights(packet, &mut weights[weight_values]);
        self.model.fill_data(packet, &mut data[..geometry.data_packet_stride]);
    }

    fn test_split_at(&mut self, geometry: &Geometry, packet: u64, data: &[u8], weights: &[u8]) -> bool {
        let scales = geometry.block_scales_offset..geometry.block_weights_offset;
        let weight_values = geometry.block_weights_offset..geometry.weights_packet_stride;
        self.model.test_scales(packet, &weights[scales])
            && self.model.test_weights(packet, &weights[weight_values])
            && self.model.test_data(packet, &data[..geometry.data_packet_stride])
    }
}

fn check_len(region: &str, actual: usize, required: usize) -> Result<()> {
    if actual < required {
        return Err(VoltcapError::validation(
            region,
            format!("buffer of {} bytes is smaller than the {} byte region", actual, required),
        ));
    }
    Ok(())
}
