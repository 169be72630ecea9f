//! Common Utilities
//!
//! Bit-level helpers shared by the receiver stages

use bytes::{BufMut, Bytes, BytesMut};

/// Pack hard bits (0/1) into bytes (MSB first)
pub fn pack_bits(bits: &[u8]) -> Bytes {
    let mut bytes = BytesMut::with_capacity((bits.len() + 7) / 8);

    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            if bit != 0 {
                byte |= 1 << (7 - i);
            }
        }
        bytes.put_u8(byte);
    }

    bytes.freeze()
}

/// Unpack bytes into hard bits (0/1) (MSB first)
pub fn unpack_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);

    for &byte in bytes {
        for i in 0..8 {
            bits.push((byte >> (7 - i)) & 1);
        }
    }

    bits
}
