//! Seekable pseudo-random byte sequences for end-to-end integrity checks
//!
//! The byte at position `n` is a pure function of the seed and `n`: the
//! sequence is the extendable output of a keyed BLAKE3 hash, whose reader
//! can be positioned anywhere in constant time. A writer stamps payloads
//! with [`RandomSequence::generate`]; a reader seeks to the observation
//! offset of whatever range it holds and calls [`RandomSequence::validate`].

use std::fmt;

use blake3::{Hasher, OutputReader};

use crate::error::{Result, VoltcapError};
use crate::header::{keys, AsciiHeader};

/// Domain separation context for key derivation
const KEY_CONTEXT: &str = "voltcap random sequence v1 key";

/// Bytes compared per step during validation
const VALIDATE_CHUNK: usize = 4096;

/// Deterministic, seekable byte generator and validator
#[derive(Clone)]
pub struct RandomSequence {
    seed: u64,
    reader: OutputReader,
}

impl RandomSequence {
    pub fn from_seed(seed: u64) -> Self {
        Self::from_seed_and_stream(seed, "")
    }

    /// Independent sequence for a named stream under the same seed
    pub fn from_seed_and_stream(seed: u64, stream: &str) -> Self {
        let mut derive = Hasher::new_derive_key(KEY_CONTEXT);
        derive.update(&seed.to_le_bytes());
        derive.update(stream.as_bytes());
        let key: [u8; 32] = *derive.finalize().as_bytes();

        Self {
            seed,
            reader: Hasher::new_keyed(&key).finalize_xof(),
        }
    }

    /// Sequence seeded from a header, positioned at zero
    pub fn from_header(header: &AsciiHeader) -> Result<Self> {
        Ok(Self::from_seed(seed_from_header(header)?))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Current logical byte position
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    /// Fill `buf` with the sequence at the current position and advance
    pub fn generate(&mut self, buf: &mut [u8]) {
        self.reader.fill(buf);
    }

    /// Compare `buf` against the sequence at the current position
    ///
    /// The position advances by `buf.len()` whether or not the bytes match.
    pub fn validate(&mut self, buf: &[u8]) -> bool {
        let end = self.position() + buf.len() as u64;
        let mut expected = [0u8; VALIDATE_CHUNK];
        let mut matched = true;
        for chunk in buf.chunks(VALIDATE_CHUNK) {
            let expected = &mut expected[..chunk.len()];
            self.reader.fill(expected);
            if expected[..] != chunk[..] {
                matched = false;
                break;
            }
        }
        self.reader.set_position(end);
        matched
    }

    /// Return to position zero
    pub fn reset(&mut self) {
        self.reader.set_position(0);
    }

    /// Move to an absolute byte position
    pub fn seek(&mut self, position: u64) {
        self.reader.set_position(position);
    }
}

impl fmt::Debug for RandomSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomSequence")
            .field("seed", &self.seed)
            .field("position", &self.position())
            .finish()
    }
}

/// Seed for integrity generators: `SEED` when present, otherwise derived
/// from `UTC_START`
pub fn seed_from_header(header: &AsciiHeader) -> Result<u64> {
    if header.has(keys::SEED) {
        return header.get_u64(keys::SEED);
    }
    if !header.has(keys::UTC_START) {
        return Err(VoltcapError::validation(keys::UTC_START, "missing header field (and no SEED)"));
    }
    let utc_start = header.get_val(keys::UTC_START)?;
    let digest = blake3::hash(utc_start.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest.as_bytes()[..8]);
    Ok(u64::from_le_bytes(seed))
}
