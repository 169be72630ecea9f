//! OFDM Symbol Selection
//!
//! Walks the continuous downlink sample stream symbol by symbol, strips the
//! cyclic prefixes and emits the samples that constitute valid OFDM symbols
//! for synchronization-sequence matching. Tracks the assumed half-frame
//! alignment and a lock state; while locked, alignment corrections are
//! ignored.

use crate::phy::frame::{Numerology, SYMBOLS_PER_SLOT};
use common::stream::{ControlMessage, SymbolBlock};
use num_complex::Complex32;
use std::collections::VecDeque;
use tracing::debug;

/// Symbol/offset selector stage
pub struct SymbolSelector {
    num: Numerology,
    /// Buffered input samples; `buffer_start` is the absolute offset of the
    /// front element
    buffer: VecDeque<Complex32>,
    buffer_start: u64,
    /// Assumed half-frame start position
    half_frame_start: u64,
    /// Absolute prefixed start of the next symbol to extract
    next_sym_pos: u64,
    /// Symbol index within the current slot
    sym_in_slot: usize,
    locked: bool,
    /// Symbols emitted since the last realignment
    consecutive_syms: u64,
    inbox: VecDeque<ControlMessage>,
}

impl SymbolSelector {
    /// Create a selector for the given FFT length, aligned to stream
    /// position zero
    pub fn new(fft_len: usize) -> Self {
        Self {
            num: Numerology::new(fft_len),
            buffer: VecDeque::new(),
            buffer_start: 0,
            half_frame_start: 0,
            next_sym_pos: 0,
            sym_in_slot: 0,
            locked: false,
            consecutive_syms: 0,
            inbox: VecDeque::new(),
        }
    }

    /// Queue a control message; applied at the start of the next call
    pub fn push_message(&mut self, msg: ControlMessage) {
        self.inbox.push_back(msg);
    }

    /// Freeze position tracking (idempotent)
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Resume position tracking (idempotent)
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Assumed half-frame start position
    pub fn half_frame_start(&self) -> u64 {
        self.half_frame_start
    }

    /// Symbols emitted since the last realignment
    pub fn consecutive_symbols(&self) -> u64 {
        self.consecutive_syms
    }

    /// Feed a batch of input samples and try to extract the next symbol
    ///
    /// Returns `None` while the buffered input does not yet cover the next
    /// symbol; the caller is expected to supply more samples. Emits at most
    /// one symbol per call, with the prefix stripped and the long prefix
    /// applied on slot boundaries.
    pub fn process(&mut self, input: &[Complex32]) -> Option<SymbolBlock> {
        self.drain_inbox();
        self.buffer.extend(input.iter().copied());

        let cp = self.num.cp_len_for(self.sym_in_slot) as u64;
        let data_start = self.next_sym_pos + cp;
        let data_end = data_start + self.num.fft_len as u64;
        if data_end > self.buffer_start + self.buffer.len() as u64 {
            return None;
        }

        let rel = (data_start - self.buffer_start) as usize;
        let samples: Vec<Complex32> = self
            .buffer
            .iter()
            .skip(rel)
            .take(self.num.fft_len)
            .copied()
            .collect();

        self.next_sym_pos += cp + self.num.fft_len as u64;
        self.sym_in_slot = (self.sym_in_slot + 1) % SYMBOLS_PER_SLOT;
        self.consecutive_syms += 1;
        self.discard_consumed();

        Some(SymbolBlock {
            samples,
            source_offset: data_start,
        })
    }

    /// Realign the symbol grid to a corrected half-frame start
    ///
    /// Ignored while locked. The next extraction starts at the first symbol
    /// boundary at or after the current stream position.
    pub fn set_half_frame_start(&mut self, start: u64) {
        if self.locked {
            return;
        }
        debug!("symbol_selector: half_frame_start = {}", start);
        self.half_frame_start = start;
        self.consecutive_syms = 0;

        let pos = self.buffer_start;
        if start >= pos {
            self.next_sym_pos = start;
            self.sym_in_slot = 0;
            return;
        }

        let slot_len = self.num.slot_len as u64;
        let rel = pos - start;
        let slot = rel / slot_len;
        let within = rel % slot_len;

        for s in 0..SYMBOLS_PER_SLOT {
            let sym_off = self.num.symbol_offset_in_slot(s) as u64;
            if sym_off >= within {
                self.next_sym_pos = start + slot * slot_len + sym_off;
                self.sym_in_slot = s;
                return;
            }
        }
        // Past the last symbol boundary of this slot; continue at the next
        // slot.
        self.next_sym_pos = start + (slot + 1) * slot_len;
        self.sym_in_slot = 0;
    }

    fn drain_inbox(&mut self) {
        while let Some(msg) = self.inbox.pop_front() {
            match msg {
                ControlMessage::Lock => self.lock(),
                ControlMessage::Unlock => self.unlock(),
                ControlMessage::HalfFrameStart(start) => self.set_half_frame_start(start),
                _ => {}
            }
        }
    }

    fn discard_consumed(&mut self) {
        while self.buffer_start < self.next_sym_pos && !self.buffer.is_empty() {
            self.buffer.pop_front();
            self.buffer_start += 1;
        }
    }
}
