//! Host to wire order conversion
//!
//! Wire order is big-endian. Conversions are pure and cannot fail; the
//! slice helpers panic only when the slice is shorter than the integer,
//! which callers rule out by sizing regions from the packet layout.

use byteorder::{BigEndian, ByteOrder};

/// Fixed-width unsigned integers that travel in wire order
pub trait WireOrder: Copy {
    /// Width in bytes
    const WIDTH: usize;

    /// Convert a host-order value to wire order
    fn to_wire(self) -> Self;

    /// Convert a wire-order value to host order
    fn from_wire(self) -> Self;

    /// Write the value into the start of `buf` in wire order
    fn write_wire(self, buf: &mut [u8]);

    /// Read a wire-order value from the start of `buf`
    fn read_wire(buf: &[u8]) -> Self;
}

impl WireOrder for u16 {
    const WIDTH: usize = 2;

    fn to_wire(self) -> Self {
        self.to_be()
    }

    fn from_wire(self) -> Self {
        u16::from_be(self)
    }

    fn write_wire(self, buf: &mut [u8]) {
        BigEndian::write_u16(buf, self)
    }

    fn read_wire(buf: &[u8]) -> Self {
        BigEndian::read_u16(buf)
    }
}

impl WireOrder for u32 {
    const WIDTH: usize = 4;

    fn to_wire(self) -> Self {
        self.to_be()
    }

    fn from_wire(self) -> Self {
        u32::from_be(self)
    }

    fn write_wire(self, buf: &mut [u8]) {
        BigEndian::write_u32(buf, self)
    }

    fn read_wire(buf: &[u8]) -> Self {
        BigEndian::read_u32(buf)
    }
}

impl WireOrder for u64 {
    const WIDTH: usize = 8;

    fn to_wire(self) -> Self {
        self.to_be()
    }

    fn from_wire(self) -> Self {
        u64::from_be(self)
    }

    fn write_wire(self, buf: &mut [u8]) {
        BigEndian::write_u64(buf, self)
    }

    fn read_wire(buf: &[u8]) -> Self {
        BigEndian::read_u64(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_layout_is_big_endian() {
        let mut buf = [0u8; 4];
        0x0102_0304u32.write_wire(&mut buf);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(u32::read_wire(&buf), 0x0102_0304);
        assert_eq!(0x0102_0304u32.to_wire().to_ne_bytes(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_conversion_is_involutive() {
        assert_eq!(0xbeefu16.to_wire().from_wire(), 0xbeef);
        assert_eq!(u64::MAX.to_wire().from_wire(), u64::MAX);
        assert_eq!(7u64.to_wire().from_wire(), 7);
    }
}
