//! Fixed-layout wire encoding shared by the sync transport and the config
//! storage.
//!
//! The two halves of a split keyboard are flashed independently, so the wire
//! contract must not depend on compiler-specific struct layout. Every
//! replicated block implements [`WireBlock`] with a hand-written layout:
//! documented byte offsets, little-endian multi-byte fields, and a constant
//! encoded size. A receiver can therefore validate a payload by its exact
//! length alone.

/// A state block with a fixed-size, position-stable wire encoding.
///
/// `encode` and `decode` operate on a buffer of at least [`Self::WIRE_SIZE`]
/// bytes; callers always pass exactly-sized slices. Decoding never fails:
/// every bit pattern maps to *some* block value, and out-of-range fields are
/// taken as-is (the sender is trusted once the length check has passed).
pub trait WireBlock: Sized {
    /// Encoded size in bytes. Constant per block type.
    const WIRE_SIZE: usize;

    /// Write the block into `buf[..Self::WIRE_SIZE]`.
    fn encode(&self, buf: &mut [u8]);

    /// Read a block back from `buf[..Self::WIRE_SIZE]`.
    fn decode(buf: &[u8]) -> Self;
}

/// Encode a block into a fixed array. Handy for snapshot comparison.
pub fn encode_to_array<B: WireBlock, const N: usize>(block: &B) -> [u8; N] {
    debug_assert!(N == B::WIRE_SIZE);
    let mut buf = [0u8; N];
    block.encode(&mut buf);
    buf
}
