//! Transport-block CRC
//!
//! 3GPP TS 36.212 Section 5.1.1. The PBCH attaches a CRC-16 (polynomial
//! 0x1021, zero initial state, no reflection) whose bits are XOR-masked with
//! a pattern identifying the transmit-antenna configuration. The mask lives
//! outside the generator, so checking a candidate configuration means
//! applying its mask to the computed checksum before comparing.

use crate::LayerError;
use common::utils::pack_bits;
use crc::{Crc, CRC_16_XMODEM};

/// 16-bit CRC with polynomial 0x1021, zero init, no reflection
const LTE_CRC_16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Number of attached checksum bits
pub const CRC_LEN: usize = 16;

/// Masked CRC-16 checker for unpacked bit blocks
pub struct CrcCheck {
    data_len: usize,
    final_xor: u16,
}

impl CrcCheck {
    /// Create a checker for blocks of `data_len` payload bits
    ///
    /// `final_xor` is the antenna-configuration mask applied to the computed
    /// checksum.
    pub fn new(data_len: usize, final_xor: u16) -> Result<Self, LayerError> {
        if data_len == 0 || data_len % 8 != 0 {
            return Err(LayerError::InvalidConfiguration(format!(
                "crc data length must be a positive multiple of 8, got {data_len}"
            )));
        }
        Ok(Self { data_len, final_xor })
    }

    pub fn data_len(&self) -> usize {
        self.data_len
    }

    /// Check one block of `data_len` payload bits followed by 16 CRC bits
    ///
    /// Bits are one per byte, most significant first within the attached
    /// checksum.
    pub fn check(&self, bits: &[u8]) -> Result<bool, LayerError> {
        if bits.len() != self.data_len + CRC_LEN {
            return Err(LayerError::InvalidBlockSize {
                expected: self.data_len + CRC_LEN,
                got: bits.len(),
            });
        }

        let computed = self.checksum(&bits[..self.data_len]);
        let mut received = 0u16;
        for &bit in &bits[self.data_len..] {
            received = (received << 1) | (bit & 1) as u16;
        }
        Ok(computed == received)
    }

    /// Append the masked checksum to a block of payload bits
    pub fn append(&self, bits: &[u8]) -> Result<Vec<u8>, LayerError> {
        if bits.len() != self.data_len {
            return Err(LayerError::InvalidBlockSize {
                expected: self.data_len,
                got: bits.len(),
            });
        }

        let checksum = self.checksum(bits);
        let mut out = Vec::with_capacity(self.data_len + CRC_LEN);
        out.extend_from_slice(bits);
        for i in (0..CRC_LEN).rev() {
            out.push(((checksum >> i) & 1) as u8);
        }
        Ok(out)
    }

    fn checksum(&self, data_bits: &[u8]) -> u16 {
        let packed = pack_bits(data_bits);
        LTE_CRC_16.checksum(&packed) ^ self.final_xor
    }
}
