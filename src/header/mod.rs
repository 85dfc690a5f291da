//! ASCII key/value headers that describe each captured stream

pub mod ascii;
pub mod keys;

pub use ascii::AsciiHeader;
