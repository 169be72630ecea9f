//! LTE Downlink Frame Numerology
//!
//! Sample-domain lengths derived from the FFT length for a normal
//! cyclic-prefix downlink carrier (3GPP TS 36.211 Section 6.12)

/// OFDM symbols per slot with normal cyclic prefix
pub const SYMBOLS_PER_SLOT: usize = 7;

/// Slots per radio frame (10 ms)
pub const SLOTS_PER_FRAME: usize = 20;

/// Slots per half frame (5 ms)
pub const SLOTS_PER_HALF_FRAME: usize = 10;

/// Sample-domain lengths for a given FFT length
///
/// All lengths scale from the 2048-point reference numerology by integer
/// division, matching the reference timings of TS 36.211 Table 6.12-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Numerology {
    /// FFT length (samples per symbol without prefix)
    pub fft_len: usize,
    /// Regular cyclic-prefix length
    pub cp_len: usize,
    /// Cyclic-prefix length of the first symbol in a slot
    pub cp0_len: usize,
    /// Regular symbol length including prefix
    pub sym_len: usize,
    /// First-in-slot symbol length including prefix
    pub sym0_len: usize,
    /// Slot length in samples
    pub slot_len: usize,
}

impl Numerology {
    /// Derive all lengths from the FFT length
    pub fn new(fft_len: usize) -> Self {
        let cp_len = 144 * fft_len / 2048;
        let cp0_len = 160 * fft_len / 2048;

        Self {
            fft_len,
            cp_len,
            cp0_len,
            sym_len: fft_len + cp_len,
            sym0_len: fft_len + cp0_len,
            slot_len: 7 * fft_len + 6 * cp_len + cp0_len,
        }
    }

    /// Half-frame length in samples
    pub fn half_frame_len(&self) -> usize {
        SLOTS_PER_HALF_FRAME * self.slot_len
    }

    /// Radio-frame length in samples
    pub fn frame_len(&self) -> usize {
        SLOTS_PER_FRAME * self.slot_len
    }

    /// Cyclic-prefix length for a symbol index within its slot
    ///
    /// The first symbol of each slot carries the long prefix.
    pub fn cp_len_for(&self, sym_in_slot: usize) -> usize {
        if sym_in_slot == 0 {
            self.cp0_len
        } else {
            self.cp_len
        }
    }

    /// Offset of a symbol's prefixed start within its slot
    pub fn symbol_offset_in_slot(&self, sym_in_slot: usize) -> usize {
        if sym_in_slot == 0 {
            0
        } else {
            self.sym0_len + (sym_in_slot - 1) * self.sym_len
        }
    }
}
