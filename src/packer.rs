//! Shift-register framing
//!
//! The chain shifts whole bytes, most significant bit first. A vector
//! whose length is not a multiple of [`CHUNK_BITS`] is left-padded with
//! zero bits, so the padding ends up in the first byte sent and the
//! vector's own bits keep their order at the tail of the frame.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use log::debug;

use crate::error::{Error, Result};
use crate::lights::LightVector;

/// Width of one shift register
pub const CHUNK_BITS: usize = 8;

/// Number of bytes needed for `bits` fixtures
pub const fn packed_len(bits: usize) -> usize {
    bits.div_ceil(CHUNK_BITS)
}

/// Zero bits prepended in front of `bits` fixtures
pub const fn padding_bits(bits: usize) -> usize {
    packed_len(bits) * CHUNK_BITS - bits
}

/// One frame for the shift-register chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Packed fixture bits, first byte shifted out first
    pub bytes: &'a [u8],
    /// Global intensity (0-255)
    pub brightness: u8,
}

impl Frame<'_> {
    /// PWM duty for the active-low output-enable line
    pub const fn output_enable_duty(&self) -> u8 {
        255 - self.brightness
    }
}

/// Pack a vector into a freshly allocated buffer
pub fn pack(vector: &LightVector) -> Vec<u8> {
    let mut bytes = vec![0; packed_len(vector.len())];
    pack_into(vector, &mut bytes);
    bytes
}

/// Restore a vector of `len` fixtures from a packed frame
pub fn unpack(bytes: &[u8], len: usize) -> Result<LightVector> {
    if bytes.len() != packed_len(len) {
        return Err(Error::InvalidInput(format!(
            "frame of {} bytes cannot hold exactly {len} fixtures",
            bytes.len()
        )));
    }
    let padding = padding_bits(len);
    let bits: Vec<bool> = (padding..padding + len)
        .map(|position| bytes[position / CHUNK_BITS] & (0x80 >> (position % CHUNK_BITS)) != 0)
        .collect();
    Ok(LightVector::from(bits))
}

/// `bytes` must be exactly `packed_len(vector.len())` long
fn pack_into(vector: &LightVector, bytes: &mut [u8]) {
    bytes.fill(0);
    let padding = padding_bits(vector.len());
    for (index, on) in vector.iter().enumerate() {
        if on {
            let position = padding + index;
            bytes[position / CHUNK_BITS] |= 0x80 >> (position % CHUNK_BITS);
        }
    }
}

/// Packs vectors into an owned output buffer
///
/// The buffer is reused while the vector length stays the same. A vector of
/// another length always gets a newly allocated buffer; the old one is
/// dropped and never packed into again.
#[derive(Debug, Default)]
pub struct BitPacker {
    buffer: Vec<u8>,
    /// Vector length the buffer was allocated for
    bits: Option<usize>,
    allocations: u32,
}

impl BitPacker {
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            bits: None,
            allocations: 0,
        }
    }

    /// Pack `vector` and return the frame bytes
    pub fn pack(&mut self, vector: &LightVector) -> &[u8] {
        if self.bits != Some(vector.len()) {
            debug!(
                "[BitPacker.pack] allocating {} bytes for {} fixtures",
                packed_len(vector.len()),
                vector.len()
            );
            self.buffer = vec![0; packed_len(vector.len())];
            self.bits = Some(vector.len());
            self.allocations = self.allocations.wrapping_add(1);
        }
        pack_into(vector, &mut self.buffer);
        &self.buffer
    }

    /// Drop the current buffer
    pub fn reset(&mut self) {
        self.buffer = Vec::new();
        self.bits = None;
    }

    /// Last packed bytes
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Vector length the current buffer belongs to
    pub const fn bits(&self) -> Option<usize> {
        self.bits
    }

    /// Number of buffers allocated so far
    pub const fn allocations(&self) -> u32 {
        self.allocations
    }
}
