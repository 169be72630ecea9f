//! Primary Synchronization Signal Generation
//!
//! Generates the frequency- and time-domain PSS reference waveforms used
//! for primary synchronization, according to 3GPP TS 36.211 Section 6.11.1

use num_complex::Complex32;
use num_traits::Zero;
use rustfft::FftPlanner;
use std::f32::consts::PI;
use tracing::debug;

/// PSS frequency-domain sequence length
pub const PSS_LENGTH: usize = 62;

/// Zadoff-Chu root indices by sector id N_id_2
const ROOT_INDEX: [f32; 3] = [25.0, 29.0, 34.0];

/// PSS reference-waveform generator
///
/// The time-domain waveform is cached; it is regenerated only when the
/// sector id or the transform length changes.
#[derive(Debug, Clone)]
pub struct PssGenerator {
    /// Sector id N_id_2 (0-2)
    nid2: u8,
    /// Inverse transform length
    fft_len: usize,
    /// Cached time-domain reference waveform
    time_sequence: Vec<Complex32>,
}

impl PssGenerator {
    /// Create a generator for sector id `nid2` (0-2) and transform length
    /// `fft_len`
    pub fn new(nid2: u8, fft_len: usize) -> Self {
        let time_sequence = generate_time_sequence(nid2, fft_len);

        Self {
            nid2,
            fft_len,
            time_sequence,
        }
    }

    /// Frequency-domain Zadoff-Chu sequence for sector id `nid2`
    ///
    /// A sector id outside 0-2 is a programming error, not a runtime
    /// condition.
    pub fn frequency_sequence(nid2: u8) -> [Complex32; PSS_LENGTH] {
        assert!(nid2 < 3, "sector id out of range: {}", nid2);
        let u = ROOT_INDEX[nid2 as usize];

        let mut zc = [Complex32::zero(); PSS_LENGTH];
        for (n, value) in zc.iter_mut().enumerate().take(31) {
            let phase = PI * u * -((n * (n + 1)) as f32) / 63.0;
            *value = Complex32::from_polar(1.0, phase);
        }
        for (n, value) in zc.iter_mut().enumerate().skip(31) {
            let phase = PI * u * -(((n + 1) * (n + 2)) as f32) / 63.0;
            *value = Complex32::from_polar(1.0, phase);
        }
        zc
    }

    /// Cached time-domain reference waveform
    pub fn time_sequence(&self) -> &[Complex32] {
        &self.time_sequence
    }

    /// Conjugated time-domain waveform (matched filter for correlation)
    pub fn conjugate_sequence(&self) -> Vec<Complex32> {
        self.time_sequence.iter().map(|s| s.conj()).collect()
    }

    /// Sector id N_id_2
    pub fn nid2(&self) -> u8 {
        self.nid2
    }

    /// Transform length
    pub fn fft_len(&self) -> usize {
        self.fft_len
    }

    /// Switch to a different sector id; regenerates only on change
    pub fn set_nid2(&mut self, nid2: u8) {
        if nid2 == self.nid2 {
            return;
        }
        self.nid2 = nid2;
        self.time_sequence = generate_time_sequence(nid2, self.fft_len);
    }

    /// Switch to a different transform length; regenerates only on change
    pub fn set_fft_len(&mut self, fft_len: usize) {
        if fft_len == self.fft_len {
            return;
        }
        self.fft_len = fft_len;
        self.time_sequence = generate_time_sequence(self.nid2, fft_len);
    }
}

/// Place the 62 Zadoff-Chu values into a zero-padded length-`fft_len`
/// buffer (first half at the negative-frequency edge, second half at the
/// low positive frequencies) and inverse-transform.
///
/// The inverse transform is unnormalized, the same convention as
/// FFTW_BACKWARD.
fn generate_time_sequence(nid2: u8, fft_len: usize) -> Vec<Complex32> {
    assert!(fft_len >= 64, "transform too short for 62 occupied bins");
    let zc = PssGenerator::frequency_sequence(nid2);

    let mut buffer = vec![Complex32::zero(); fft_len];
    buffer[fft_len - 31..].copy_from_slice(&zc[..31]);
    buffer[1..32].copy_from_slice(&zc[31..62]);

    let mut planner = FftPlanner::new();
    planner.plan_fft_inverse(fft_len).process(&mut buffer);

    debug!(
        "generated PSS time sequence: nid2={}, fft_len={}",
        nid2, fft_len
    );
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_sequence_is_unit_magnitude() {
        for nid2 in 0..3 {
            let zc = PssGenerator::frequency_sequence(nid2);
            assert_eq!(zc.len(), PSS_LENGTH);
            for value in zc.iter() {
                assert!((value.norm() - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = PssGenerator::new(1, 128);
        let b = PssGenerator::new(1, 128);
        assert_eq!(a.time_sequence(), b.time_sequence());
    }

    #[test]
    fn test_sector_ids_differ() {
        let a = PssGenerator::new(0, 128);
        let b = PssGenerator::new(2, 128);
        assert_ne!(a.time_sequence(), b.time_sequence());
    }

    #[test]
    fn test_conjugate_negates_imaginary_part() {
        let gen = PssGenerator::new(1, 128);
        let conj = gen.conjugate_sequence();
        for (c, s) in conj.iter().zip(gen.time_sequence()) {
            assert_eq!(c.re, s.re);
            assert_eq!(c.im, -s.im);
        }
    }

    #[test]
    fn test_regeneration_on_change_only() {
        let mut gen = PssGenerator::new(1, 128);
        let before = gen.time_sequence().to_vec();
        assert_eq!(gen.nid2(), 1);
        assert_eq!(gen.fft_len(), 128);

        gen.set_nid2(1);
        gen.set_fft_len(128);
        assert_eq!(gen.time_sequence(), before.as_slice());

        gen.set_nid2(2);
        assert_eq!(gen.nid2(), 2);
        assert_ne!(gen.time_sequence(), before.as_slice());

        gen.set_nid2(1);
        assert_eq!(gen.time_sequence(), before.as_slice());
    }
}
