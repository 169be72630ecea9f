//! Physical Broadcast Channel descrambling
//!
//! 3GPP TS 36.211 Section 6.6.1. The PBCH soft bits of one 40 ms TTI are
//! scrambled with a cell-specific Gold sequence; [`PbchDescrambler`] removes
//! it and marks the four radio-frame quarters so a downstream decoder can
//! reassemble and combine them.

use crate::LayerError;
use common::stream::{ControlMessage, SoftBlock, Tag, TagKey};
use common::types::CellId;
use std::collections::VecDeque;
use tracing::debug;

/// Soft values covering one full PBCH TTI (four radio frames)
pub const PBCH_BLOCK_LEN: usize = 1920;
/// Gold-sequence warm-up discard, fixed by the standard
const NC: usize = 1600;
/// Soft values per radio-frame quarter
pub const QUARTER_LEN: usize = PBCH_BLOCK_LEN / 4;

/// Length-31 Gold sequence c(n) per TS 36.211 Section 7.2
///
/// x1 is seeded with a single one, x2 carries the initialization value in
/// its first 31 bits. The first `NC` output bits are discarded.
fn gold_sequence(len: usize, cinit: u32) -> Vec<u8> {
    let mut x1 = vec![0u8; 3 * len + NC];
    let mut x2 = vec![0u8; 3 * len + NC];

    let mut init = cinit;
    for bit in x2.iter_mut().take(31) {
        *bit = (init % 2) as u8;
        init /= 2;
    }
    x1[0] = 1;

    for n in 0..2 * len + NC - 3 {
        x1[n + 31] = (x1[n + 3] + x1[n]) % 2;
        x2[n + 31] = (x2[n + 3] + x2[n + 2] + x2[n + 1] + x2[n]) % 2;
    }

    (0..len).map(|n| (x1[n + NC] + x2[n + NC]) % 2).collect()
}

/// Broadcast-channel descrambler
///
/// Idle until a [`ControlMessage::CellId`] arrives; the scrambling sequence
/// is regenerated only when the identity actually changes.
#[derive(Default)]
pub struct PbchDescrambler {
    cell_id: Option<CellId>,
    /// NRZ-coded scrambling sequence for the current cell identity
    pn_seq: Vec<f32>,
    inbox: VecDeque<ControlMessage>,
}

impl PbchDescrambler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a control message; applied at the start of the next call
    pub fn push_message(&mut self, msg: ControlMessage) {
        self.inbox.push_back(msg);
    }

    pub fn cell_id(&self) -> Option<CellId> {
        self.cell_id
    }

    /// Switch to a new cell identity, regenerating the sequence on change
    pub fn set_cell_id(&mut self, id: CellId) {
        if self.cell_id == Some(id) {
            return;
        }
        debug!(cell_id = id.0, "pbch_descrambler: new scrambling sequence");
        self.pn_seq = gold_sequence(PBCH_BLOCK_LEN, id.0 as u32)
            .into_iter()
            .map(|b| 1.0 - 2.0 * b as f32)
            .collect();
        self.cell_id = Some(id);
    }

    /// Descramble one TTI of soft values
    ///
    /// Returns `None` while no cell identity is set. The output block carries
    /// the four quarter markers at positions 0, 480, 960 and 1440.
    pub fn process(&mut self, block: &SoftBlock) -> Result<Option<SoftBlock>, LayerError> {
        self.drain_inbox();
        if block.values.len() != PBCH_BLOCK_LEN {
            return Err(LayerError::InvalidBlockSize {
                expected: PBCH_BLOCK_LEN,
                got: block.values.len(),
            });
        }
        if self.cell_id.is_none() {
            return Ok(None);
        }

        let values: Vec<f32> = block
            .values
            .iter()
            .zip(self.pn_seq.iter())
            .map(|(v, s)| v * s)
            .collect();

        let tags = (0..4)
            .map(|i| Tag {
                position: i * QUARTER_LEN,
                key: TagKey::PbchQuarter,
                value: i as i64,
            })
            .collect();

        Ok(Some(SoftBlock {
            values,
            source_offset: block.source_offset,
            tags,
        }))
    }

    fn drain_inbox(&mut self) {
        while let Some(msg) = self.inbox.pop_front() {
            if let ControlMessage::CellId(id) = msg {
                self.set_cell_id(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gold_sequence_is_binary_and_cell_specific() {
        let a = gold_sequence(PBCH_BLOCK_LEN, 0);
        let b = gold_sequence(PBCH_BLOCK_LEN, 124);
        assert_eq!(a.len(), PBCH_BLOCK_LEN);
        assert!(a.iter().all(|&bit| bit <= 1));
        assert_ne!(a, b);
    }

    #[test]
    fn test_idle_until_cell_id_set() {
        let mut descrambler = PbchDescrambler::new();
        let block = SoftBlock::new(vec![1.0; PBCH_BLOCK_LEN], 0);
        assert_eq!(descrambler.process(&block).unwrap(), None);

        descrambler.push_message(ControlMessage::CellId(CellId(124)));
        assert!(descrambler.process(&block).unwrap().is_some());
        assert_eq!(descrambler.cell_id(), Some(CellId(124)));
    }

    #[test]
    fn test_descrambling_is_self_inverse() {
        let mut descrambler = PbchDescrambler::new();
        descrambler.set_cell_id(CellId(301));

        let values: Vec<f32> = (0..PBCH_BLOCK_LEN).map(|i| i as f32 * 0.25 - 100.0).collect();
        let block = SoftBlock::new(values.clone(), 7);

        let once = descrambler.process(&block).unwrap().unwrap();
        assert_ne!(once.values, values);
        let twice = descrambler.process(&once).unwrap().unwrap();
        assert_eq!(twice.values, values);
        assert_eq!(twice.source_offset, 7);
    }

    #[test]
    fn test_quarter_markers() {
        let mut descrambler = PbchDescrambler::new();
        descrambler.set_cell_id(CellId(0));
        let block = SoftBlock::new(vec![0.5; PBCH_BLOCK_LEN], 0);

        let out = descrambler.process(&block).unwrap().unwrap();
        let expected: Vec<Tag> = (0..4)
            .map(|i| Tag {
                position: i * 480,
                key: TagKey::PbchQuarter,
                value: i as i64,
            })
            .collect();
        assert_eq!(out.tags, expected);
    }

    #[test]
    fn test_rejects_wrong_block_size() {
        let mut descrambler = PbchDescrambler::new();
        descrambler.set_cell_id(CellId(0));
        let block = SoftBlock::new(vec![0.0; 100], 0);
        assert!(matches!(
            descrambler.process(&block),
            Err(LayerError::InvalidBlockSize { expected: 1920, got: 100 })
        ));
    }
}
