//! Packet and heap byte geometry

pub mod heap;
pub mod packet;

pub use heap::HeapLayout;
pub use packet::{PacketLayout, UdpPacketLayout};
