//! Signal models that decide what a synthetic packet contains

use crate::error::Result;
use crate::header::AsciiHeader;
use crate::layout::PacketLayout;

/// Content strategy for synthetic packets
///
/// A model fills and checks the scales, weights and data of one packet at a
/// time. `packet` is the index of the packet within the stream, so that
/// filling and checking can happen in different orders or on different
/// instances. Where each region lives is decided by the
/// [`PacketGenerator`](super::PacketGenerator), not by the model.
pub trait SignalModel: std::fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Prepare the model for packets described by `header` and `layout`
    ///
    /// On failure the model keeps its previous configuration.
    fn configure(&mut self, header: &AsciiHeader, layout: &dyn PacketLayout) -> Result<()>;

    fn fill_scales(&mut self, packet: u64, buf: &mut [u8]);
    fn fill_weights(&mut self, packet: u64, buf: &mut [u8]);
    fn fill_data(&mut self, packet: u64, buf: &mut [u8]);

    fn test_scales(&mut self, packet: u64, buf: &[u8]) -> bool;
    fn test_weights(&mut self, packet: u64, buf: &[u8]) -> bool;
    fn test_data(&mut self, packet: u64, buf: &[u8]) -> bool;
}
