//! Control Format Indicator detection
//!
//! 3GPP TS 36.212 Section 5.3.4. The CFI (1-3 control symbols per subframe)
//! is block-coded into one of three fixed 32-bit codewords; [`CfiDetector`]
//! picks the codeword with the highest correlation against the received soft
//! bits and publishes it together with the current subframe index.

use crate::LayerError;
use common::stream::ControlMessage;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::info;

/// Soft bits per CFI codeword
pub const CFI_CODEWORD_LEN: usize = 32;

/// The three CFI codewords, TS 36.212 Table 5.3.4-1
const CFI_CODEWORDS: [[u8; CFI_CODEWORD_LEN]; 3] = [
    [
        0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1,
        0, 1,
    ],
    [
        1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1,
        1, 0,
    ],
    [
        1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0,
        1, 1,
    ],
];

/// One CFI decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CfiResult {
    /// Subframe the decision belongs to
    pub subframe: u8,
    /// Detected indicator (1-3); 0 when no codeword correlated positively
    pub cfi: u8,
    /// Correlation value of the winning codeword
    pub correlation: f32,
}

/// Control-format detector
///
/// The subframe association rides in on [`ControlMessage::SubframeIndex`]
/// and persists until the next one arrives.
pub struct CfiDetector {
    /// NRZ-coded reference codewords
    ref_seqs: [[f32; CFI_CODEWORD_LEN]; 3],
    subframe: u8,
    inbox: VecDeque<ControlMessage>,
    /// Decision history for diagnostics, kept only when enabled
    history: Option<Vec<u8>>,
}

impl CfiDetector {
    pub fn new() -> Self {
        let mut ref_seqs = [[0.0f32; CFI_CODEWORD_LEN]; 3];
        for (seq, word) in ref_seqs.iter_mut().zip(CFI_CODEWORDS.iter()) {
            for (value, &bit) in seq.iter_mut().zip(word.iter()) {
                *value = 1.0 - 2.0 * bit as f32;
            }
        }
        Self {
            ref_seqs,
            subframe: 0,
            inbox: VecDeque::new(),
            history: None,
        }
    }

    /// Keep a history of indicator decisions for diagnostics
    pub fn enable_history(&mut self) {
        self.history = Some(Vec::new());
    }

    pub fn history(&self) -> Option<&[u8]> {
        self.history.as_deref()
    }

    /// Queue a control message; applied at the start of the next call
    pub fn push_message(&mut self, msg: ControlMessage) {
        self.inbox.push_back(msg);
    }

    /// Detect the CFI in one block of 32 soft bits
    ///
    /// Returns the decision and the message to publish downstream.
    pub fn process(&mut self, soft_bits: &[f32]) -> Result<(CfiResult, ControlMessage), LayerError> {
        if soft_bits.len() != CFI_CODEWORD_LEN {
            return Err(LayerError::InvalidBlockSize {
                expected: CFI_CODEWORD_LEN,
                got: soft_bits.len(),
            });
        }
        self.drain_inbox();

        let mut cfi = 0u8;
        let mut max_val = 0.0f32;
        for (i, seq) in self.ref_seqs.iter().enumerate() {
            let val: f32 = soft_bits.iter().zip(seq.iter()).map(|(a, b)| a * b).sum();
            if val > max_val {
                cfi = i as u8 + 1;
                max_val = val;
            }
        }

        let result = CfiResult {
            subframe: self.subframe,
            cfi,
            correlation: max_val,
        };
        info!(
            subframe = result.subframe,
            cfi = result.cfi,
            correlation = result.correlation,
            "cfi decision"
        );
        if let Some(history) = self.history.as_mut() {
            history.push(cfi);
        }

        Ok((
            result,
            ControlMessage::Cfi {
                subframe: result.subframe,
                cfi: result.cfi,
            },
        ))
    }

    fn drain_inbox(&mut self) {
        while let Some(msg) = self.inbox.pop_front() {
            if let ControlMessage::SubframeIndex(n) = msg {
                self.subframe = n;
            }
        }
    }
}

impl Default for CfiDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nrz_codeword(index: usize, scale: f32) -> Vec<f32> {
        CFI_CODEWORDS[index]
            .iter()
            .map(|&b| (1.0 - 2.0 * b as f32) * scale)
            .collect()
    }

    #[test]
    fn test_detects_each_codeword() {
        let mut detector = CfiDetector::new();
        for i in 0..3 {
            let (result, msg) = detector.process(&nrz_codeword(i, 1.0)).unwrap();
            assert_eq!(result.cfi, i as u8 + 1);
            assert_eq!(result.correlation, 32.0);
            assert_eq!(msg, ControlMessage::Cfi { subframe: 0, cfi: i as u8 + 1 });
        }
    }

    #[test]
    fn test_scaled_noisy_codeword_still_wins() {
        let mut detector = CfiDetector::new();
        let mut soft = nrz_codeword(1, 0.5);
        soft[0] = -soft[0];
        soft[17] = -soft[17];
        let (result, _) = detector.process(&soft).unwrap();
        assert_eq!(result.cfi, 2);
    }

    #[test]
    fn test_all_nonpositive_correlations_yield_zero() {
        let mut detector = CfiDetector::new();
        let (result, msg) = detector.process(&[0.0; CFI_CODEWORD_LEN]).unwrap();
        assert_eq!(result.cfi, 0);
        assert_eq!(result.correlation, 0.0);
        assert_eq!(msg, ControlMessage::Cfi { subframe: 0, cfi: 0 });
    }

    #[test]
    fn test_subframe_association_persists() {
        let mut detector = CfiDetector::new();
        detector.push_message(ControlMessage::SubframeIndex(4));
        let (result, _) = detector.process(&nrz_codeword(0, 1.0)).unwrap();
        assert_eq!(result.subframe, 4);
        // No new message: the previous association carries over.
        let (result, _) = detector.process(&nrz_codeword(2, 1.0)).unwrap();
        assert_eq!(result.subframe, 4);
    }

    #[test]
    fn test_history_when_enabled() {
        let mut detector = CfiDetector::new();
        assert_eq!(detector.history(), None);
        detector.enable_history();
        detector.process(&nrz_codeword(0, 1.0)).unwrap();
        detector.process(&nrz_codeword(2, 1.0)).unwrap();
        assert_eq!(detector.history(), Some(&[1u8, 3u8][..]));
    }

    #[test]
    fn test_rejects_wrong_block_size() {
        let mut detector = CfiDetector::new();
        assert!(matches!(
            detector.process(&[0.0; 31]),
            Err(LayerError::InvalidBlockSize { expected: 32, got: 31 })
        ));
    }
}
