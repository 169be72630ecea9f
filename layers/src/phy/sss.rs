//! Secondary Synchronization Signal (SSS)
//!
//! 3GPP TS 36.211 Section 6.11.2. The SSS interleaves two length-31
//! M-sequences whose cyclic shifts (m0, m1) encode the cell-identity group,
//! scrambled by sequences that depend on the sector id. [`SssResolver`]
//! recovers the shifts from a received frequency-domain symbol by
//! cross-correlation against a fixed reference, looks up the group and
//! publishes the cell identity and frame timing once the detection has been
//! stable for several half-frames. [`SssGenerator`] synthesizes the
//! transmitted symbol for a known cell identity.

use crate::phy::frame::{Numerology, SLOTS_PER_FRAME, SLOTS_PER_HALF_FRAME};
use crate::LayerError;
use common::stream::{ControlMessage, SymbolBlock};
use common::types::CellId;
use num_complex::Complex32;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Length of each interleaved M-sequence
pub const SSS_SEQ_LEN: usize = 31;
/// Occupied subcarriers of the SSS symbol (6 resource blocks)
pub const SSS_SYMBOL_LEN: usize = 72;
/// Number of cell-identity groups encoded by the (m0, m1) pair
pub const NUM_GROUPS: usize = 168;

/// Scrambling base sequence c, NRZ coded
///
/// Recurrence x[i+5] = x[i+3] + x[i] over GF(2), seeded x[4] = 1.
fn c_sequence() -> [f32; SSS_SEQ_LEN] {
    let mut x = [0u8; SSS_SEQ_LEN];
    x[4] = 1;
    for i in 0..26 {
        x[i + 5] = (x[i + 3] + x[i]) % 2;
    }
    nrz(&x)
}

/// Shift-register base sequence s, NRZ coded
///
/// Recurrence x[i+5] = x[i+2] + x[i] over GF(2), seeded x[4] = 1.
fn s_sequence() -> [f32; SSS_SEQ_LEN] {
    let mut x = [0u8; SSS_SEQ_LEN];
    x[4] = 1;
    for i in 0..26 {
        x[i + 5] = (x[i + 2] + x[i]) % 2;
    }
    nrz(&x)
}

/// Second scrambling base sequence z, NRZ coded
///
/// Recurrence x[i+5] = x[i+4] + x[i+2] + x[i+1] + x[i] over GF(2),
/// seeded x[4] = 1.
fn z_sequence() -> [f32; SSS_SEQ_LEN] {
    let mut x = [0u8; SSS_SEQ_LEN];
    x[4] = 1;
    for i in 0..26 {
        x[i + 5] = (x[i + 4] + x[i + 2] + x[i + 1] + x[i]) % 2;
    }
    nrz(&x)
}

fn nrz(bits: &[u8; SSS_SEQ_LEN]) -> [f32; SSS_SEQ_LEN] {
    let mut out = [0.0f32; SSS_SEQ_LEN];
    for (value, &bit) in out.iter_mut().zip(bits.iter()) {
        *value = 1.0 - 2.0 * bit as f32;
    }
    out
}

/// (m0, m1) cyclic-shift pair for each cell-identity group
///
/// TS 36.211 Table 6.11.2.1-1, generated from the defining formulas.
fn m_pair_table() -> [(u8, u8); NUM_GROUPS] {
    let mut table = [(0u8, 0u8); NUM_GROUPS];
    for (n, entry) in table.iter_mut().enumerate() {
        let q_prime = n / 30;
        let q = (n + q_prime * (q_prime + 1) / 2) / 30;
        let m_prime = n + q * (q + 1) / 2;
        let m0 = m_prime % 31;
        let m1 = (m0 + m_prime / 31 + 1) % 31;
        *entry = (m0 as u8, m1 as u8);
    }
    table
}

/// Sliding dot product of two equal-length arrays at all 2N-1 lags
fn xcorr(x: &[Complex32], y: &[f32]) -> Vec<Complex32> {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len();
    let mut lags = Vec::with_capacity(2 * n - 1);
    for i in 0..2 * n - 1 {
        if i < n {
            lags.push(corr(&x[n - 1 - i..], &y[..i + 1]));
        } else {
            lags.push(corr(&x[..2 * n - 1 - i], &y[i - n..]));
        }
    }
    lags
}

fn corr(x: &[Complex32], y: &[f32]) -> Complex32 {
    x.iter().zip(y.iter()).map(|(&a, &b)| a * b).sum()
}

/// Cell-identity resolver
///
/// Consumes 72-subcarrier frequency-domain SSS symbol candidates and, once a
/// detection has survived the hysteresis for more than two consecutive
/// symbols, publishes [`ControlMessage::FrameStart`] and
/// [`ControlMessage::CellId`] and locks. Needs the sector id (N_id_2) from an
/// upstream [`ControlMessage::CellSubId`] before it can descramble anything.
pub struct SssResolver {
    slot_len: u64,
    c: [f32; SSS_SEQ_LEN],
    z: [f32; SSS_SEQ_LEN],
    /// Reference s-sequence at shift 0, duplicated to cover all lags
    s_ref: [f32; 2 * SSS_SEQ_LEN],
    table: [(u8, u8); NUM_GROUPS],
    nid2: Option<u8>,
    cell_id: Option<CellId>,
    frame_start: u64,
    /// Frame-half hypothesis in slots (0 or 5), toggled on a failed detection
    sss_pos: u64,
    max_val_new: f32,
    max_val_old: f32,
    consistent: u32,
    locked: bool,
    inbox: VecDeque<ControlMessage>,
}

struct SssInfo {
    group: Option<u16>,
    /// 0 for the first half-frame, 5 for the second
    pos: u64,
}

impl SssResolver {
    pub fn new(fft_len: usize) -> Self {
        let s = s_sequence();
        let mut s_ref = [0.0f32; 2 * SSS_SEQ_LEN];
        for i in 0..SSS_SEQ_LEN {
            s_ref[i] = s[i];
            s_ref[i + SSS_SEQ_LEN] = s[i];
        }
        Self {
            slot_len: Numerology::new(fft_len).slot_len as u64,
            c: c_sequence(),
            z: z_sequence(),
            s_ref,
            table: m_pair_table(),
            nid2: None,
            cell_id: None,
            frame_start: 0,
            sss_pos: 0,
            max_val_new: 0.0,
            max_val_old: 0.0,
            consistent: 0,
            locked: false,
            inbox: VecDeque::new(),
        }
    }

    /// Queue a control message; applied at the start of the next call
    pub fn push_message(&mut self, msg: ControlMessage) {
        self.inbox.push_back(msg);
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Last published cell identity, if any
    pub fn cell_id(&self) -> Option<CellId> {
        self.cell_id
    }

    /// Last computed frame start position
    pub fn frame_start(&self) -> u64 {
        self.frame_start
    }

    /// Drop the lock and restart the detection from scratch
    ///
    /// The sector id is kept; the running correlation peak, the consistency
    /// counter and the frame-half hypothesis are reset.
    pub fn unlock(&mut self) {
        self.locked = false;
        self.max_val_new = 0.0;
        self.max_val_old = 0.0;
        self.consistent = 0;
        self.sss_pos = 0;
    }

    /// Process one frequency-domain symbol candidate
    ///
    /// Returns the messages to publish downstream; empty while locked, while
    /// the sector id is unknown, or while no stable detection exists yet.
    pub fn process(&mut self, block: &SymbolBlock) -> Result<Vec<ControlMessage>, LayerError> {
        if block.samples.len() != SSS_SYMBOL_LEN {
            return Err(LayerError::InvalidBlockSize {
                expected: SSS_SYMBOL_LEN,
                got: block.samples.len(),
            });
        }

        self.drain_inbox();
        if self.locked {
            return Ok(Vec::new());
        }
        let Some(nid2) = self.nid2 else {
            return Ok(Vec::new());
        };

        // The two sequences are interleaved onto the even and odd occupied
        // subcarriers; the 5-subcarrier guard on each edge stays unused.
        let mut even = [Complex32::new(0.0, 0.0); SSS_SEQ_LEN];
        let mut odd = [Complex32::new(0.0, 0.0); SSS_SEQ_LEN];
        for i in 0..SSS_SEQ_LEN {
            even[i] = block.samples[5 + 2 * i];
            odd[i] = block.samples[5 + 2 * i + 1];
        }

        let info = self.detect(&even, &odd, nid2);
        let Some(group) = info.group else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        if self.max_val_new > self.max_val_old * 0.8 {
            let mut offset = block.source_offset;
            self.sss_pos = info.pos;
            if self.sss_pos == 5 {
                offset += SLOTS_PER_HALF_FRAME as u64 * self.slot_len;
            }
            self.frame_start = offset % (SLOTS_PER_FRAME as u64 * self.slot_len);
            self.cell_id = CellId::from_parts(group, nid2);

            self.consistent += 1;
            if self.consistent > 2 {
                let cell_id = self.cell_id.ok_or_else(|| {
                    LayerError::ProcessingError(format!("invalid cell identity group {group}"))
                })?;
                info!(
                    cell_id = cell_id.0,
                    frame_start = self.frame_start,
                    "cell identity locked"
                );
                out.push(ControlMessage::FrameStart(self.frame_start));
                out.push(ControlMessage::CellId(cell_id));
                self.locked = true;
            }
        } else {
            // Detection too weak to trust; assume we sampled the wrong
            // half-frame and flip the hypothesis.
            self.sss_pos = if self.sss_pos == 0 { 5 } else { 0 };
        }

        self.max_val_old = self.max_val_new;
        Ok(out)
    }

    fn detect(&mut self, even: &[Complex32], odd: &[Complex32], nid2: u8) -> SssInfo {
        let mut c0 = [0.0f32; SSS_SEQ_LEN];
        let mut c1 = [0.0f32; SSS_SEQ_LEN];
        for i in 0..SSS_SEQ_LEN {
            c0[i] = self.c[(i + nid2 as usize) % 31];
            c1[i] = self.c[(i + nid2 as usize + 3) % 31];
        }

        // Scrambling values are all +-1, so dividing them out is a multiply.
        let mut s0m0 = [Complex32::new(0.0, 0.0); SSS_SEQ_LEN];
        for i in 0..SSS_SEQ_LEN {
            s0m0[i] = even[i] * c0[i];
        }
        let m0 = self.calc_m(&s0m0);

        let mut s1m1 = [Complex32::new(0.0, 0.0); SSS_SEQ_LEN];
        for i in 0..SSS_SEQ_LEN {
            let z1m0 = self.z[(i + m0 % 8) % 31];
            s1m1[i] = odd[i] * c1[i] * z1m0;
        }
        let m1 = self.calc_m(&s1m1);
        debug!(m0, m1, "sss shift candidates");

        // m0 < m1 marks the first half-frame; the halves swap the shifts.
        let pos = if m0 > m1 { 5 } else { 0 };
        SssInfo {
            group: self.lookup_group(m0, m1),
            pos,
        }
    }

    /// Recover the cyclic shift of a descrambled sequence
    ///
    /// Zero-pads the sequence to 62 values and correlates it against the
    /// doubled reference at all 123 lags; the peak lag maps back to the
    /// shift. Feeds the running peak average used by the hysteresis.
    fn calc_m(&mut self, seq: &[Complex32; SSS_SEQ_LEN]) -> usize {
        let mut padded = [Complex32::new(0.0, 0.0); 2 * SSS_SEQ_LEN];
        padded[..SSS_SEQ_LEN].copy_from_slice(seq);

        let lags = xcorr(&padded, &self.s_ref);
        let mut max = 0.0f32;
        let mut pos: i64 = -1;
        for (i, value) in lags.iter().enumerate() {
            let mag = value.norm();
            if max < mag {
                max = mag;
                pos = i as i64;
            }
        }

        self.max_val_new = (self.max_val_new + max) / 2.0;
        (pos - 62).unsigned_abs() as usize
    }

    fn lookup_group(&self, m0: usize, m1: usize) -> Option<u16> {
        self.table
            .iter()
            .position(|&(a, b)| {
                let (a, b) = (a as usize, b as usize);
                (a == m0 && b == m1) || (a == m1 && b == m0)
            })
            .map(|n| n as u16)
    }

    fn drain_inbox(&mut self) {
        while let Some(msg) = self.inbox.pop_front() {
            match msg {
                ControlMessage::CellSubId(n) if n < 3 => self.nid2 = Some(n),
                ControlMessage::CellSubId(n) => {
                    debug!(nid2 = n, "ignoring out-of-range sector id")
                }
                ControlMessage::Lock => self.locked = true,
                ControlMessage::Unlock => self.unlock(),
                _ => {}
            }
        }
    }
}

/// SSS symbol synthesis for a known cell identity
///
/// Transmitter-side counterpart of [`SssResolver`]; used for receiver
/// verification.
pub struct SssGenerator {
    cell_id: CellId,
    c: [f32; SSS_SEQ_LEN],
    s: [f32; SSS_SEQ_LEN],
    z: [f32; SSS_SEQ_LEN],
    m0: usize,
    m1: usize,
}

impl SssGenerator {
    pub fn new(cell_id: CellId) -> Self {
        let (m0, m1) = m_pair_table()[cell_id.group() as usize];
        Self {
            cell_id,
            c: c_sequence(),
            s: s_sequence(),
            z: z_sequence(),
            m0: m0 as usize,
            m1: m1 as usize,
        }
    }

    pub fn cell_id(&self) -> CellId {
        self.cell_id
    }

    /// Synthesize the 72-subcarrier symbol for one half-frame
    ///
    /// The (m0, m1) shifts ride on the even/odd subcarriers in the first
    /// half-frame and swap in the second.
    pub fn symbol(&self, second_half: bool) -> Vec<Complex32> {
        let (ma, mb) = if second_half {
            (self.m1, self.m0)
        } else {
            (self.m0, self.m1)
        };
        let n2 = self.cell_id.sector() as usize;

        let mut out = vec![Complex32::new(0.0, 0.0); SSS_SYMBOL_LEN];
        for i in 0..SSS_SEQ_LEN {
            let c0 = self.c[(i + n2) % 31];
            let c1 = self.c[(i + n2 + 3) % 31];
            let z1 = self.z[(i + ma % 8) % 31];
            out[5 + 2 * i] = Complex32::new(self.s[(i + ma) % 31] * c0, 0.0);
            out[5 + 2 * i + 1] = Complex32::new(self.s[(i + mb) % 31] * c1 * z1, 0.0);
        }
        out
    }
}
