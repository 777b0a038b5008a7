//! Key estimation.
//!
//! Builds a long-term chromagram from STFT power between 80 Hz and
//! 5 kHz and picks the major or minor Krumhansl-Kessler profile, rotated
//! to each of the 12 tonics, with the highest Pearson correlation.

use crate::analysis::spectrum::{for_each_magnitude_frame, frame_count};
use crate::analysis::types::{AnalysisError, AnalysisResult, AudioBuffer, Scale};

const KEY_FFT: usize = 4096;
const KEY_HOP: usize = 2048;
const MIN_FREQ_HZ: f64 = 80.0;
const MAX_FREQ_HZ: f64 = 5000.0;

/// Pitch-class names, C first.
pub const KEY_NAMES: [&str; 12] = ["C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B"];

/// Krumhansl-Kessler probe-tone ratings, tonic first.
const MAJOR_PROFILE: [f64; 12] = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];
const MINOR_PROFILE: [f64; 12] = [6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17];

/// Best-matching key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEstimate {
    /// Pitch class of the tonic (0 = C).
    pub tonic: usize,
    pub scale: Scale,
    /// Pearson correlation with the winning profile.
    pub correlation: f64,
}

impl KeyEstimate {
    pub fn name(&self) -> &'static str {
        KEY_NAMES[self.tonic % 12]
    }
}

/// Pitch class of a frequency, or `None` outside the analysed band.
fn pitch_class(freq_hz: f64) -> Option<usize> {
    if !(MIN_FREQ_HZ..=MAX_FREQ_HZ).contains(&freq_hz) {
        return None;
    }
    let midi = 69.0 + 12.0 * (freq_hz / 440.0).log2();
    Some((midi.round() as i64).rem_euclid(12) as usize)
}

/// Accumulated spectral power per pitch class over the whole buffer.
pub fn chromagram(buffer: &AudioBuffer) -> [f64; 12] {
    let bin_hz = buffer.sample_rate as f64 / KEY_FFT as f64;
    let bin_classes: Vec<Option<usize>> = (0..=KEY_FFT / 2)
        .map(|bin| pitch_class(bin as f64 * bin_hz))
        .collect();

    let mut chroma = [0.0f64; 12];
    for_each_magnitude_frame(&buffer.samples, KEY_FFT, KEY_HOP, |_, mags| {
        for (mag, class) in mags.iter().zip(&bin_classes) {
            if let Some(pc) = class {
                chroma[*pc] += (*mag as f64) * (*mag as f64);
            }
        }
    });
    chroma
}

/// Estimate the key of `buffer`.
pub fn estimate_key(buffer: &AudioBuffer) -> AnalysisResult<KeyEstimate> {
    if frame_count(buffer.len(), KEY_FFT, KEY_HOP) == 0 {
        return Err(AnalysisError::Inconclusive(
            "audio is too short to estimate key".to_string(),
        ));
    }

    let chroma = chromagram(buffer);
    let total: f64 = chroma.iter().sum();
    if total <= 1e-9 {
        return Err(AnalysisError::Inconclusive("no tonal content detected".to_string()));
    }

    let mut best: Option<KeyEstimate> = None;
    for tonic in 0..12 {
        for (scale, profile) in [(Scale::Major, &MAJOR_PROFILE), (Scale::Minor, &MINOR_PROFILE)] {
            let rotated: [f64; 12] = std::array::from_fn(|pc| profile[(pc + 12 - tonic) % 12]);
            let correlation = pearson(&chroma, &rotated);
            if best.map_or(true, |b| correlation > b.correlation) {
                best = Some(KeyEstimate {
                    tonic,
                    scale,
                    correlation,
                });
            }
        }
    }

    best.ok_or_else(|| AnalysisError::Inconclusive("no key candidate".to_string()))
}

fn pearson(a: &[f64; 12], b: &[f64; 12]) -> f64 {
    let mean_a = a.iter().sum::<f64>() / 12.0;
    let mean_b = b.iter().sum::<f64>() / 12.0;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a <= 0.0 || var_b <= 0.0 {
        return 0.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ANALYSIS_SAMPLE_RATE;
    use std::f32::consts::PI;

    fn chord(freqs: &[f32], seconds: f32) -> AudioBuffer {
        let sr = ANALYSIS_SAMPLE_RATE as f32;
        let samples = (0..(seconds * sr) as usize)
            .map(|i| {
                let t = i as f32 / sr;
                freqs.iter().map(|f| 0.25 * (2.0 * PI * f * t).sin()).sum()
            })
            .collect();
        AudioBuffer::new(samples, ANALYSIS_SAMPLE_RATE)
    }

    #[test]
    fn maps_frequencies_to_pitch_classes() {
        assert_eq!(pitch_class(440.0), Some(9));
        assert_eq!(pitch_class(261.63), Some(0));
        assert_eq!(pitch_class(369.99), Some(6));
        assert_eq!(pitch_class(40.0), None);
        assert_eq!(pitch_class(8000.0), None);
    }

    #[test]
    fn c_major_triad() {
        let key = estimate_key(&chord(&[261.63, 329.63, 392.0], 4.0)).unwrap();
        assert_eq!(key.name(), "C");
        assert_eq!(key.scale, Scale::Major);
    }

    #[test]
    fn a_minor_triad() {
        let key = estimate_key(&chord(&[220.0, 261.63, 329.63], 4.0)).unwrap();
        assert_eq!(key.name(), "A");
        assert_eq!(key.scale, Scale::Minor);
    }

    #[test]
    fn silence_is_inconclusive() {
        let buffer = AudioBuffer::new(vec![0.0; 44_100], ANALYSIS_SAMPLE_RATE);
        assert!(matches!(estimate_key(&buffer), Err(AnalysisError::Inconclusive(_))));
    }

    #[test]
    fn pearson_of_identical_profiles_is_one() {
        assert!((pearson(&MAJOR_PROFILE, &MAJOR_PROFILE) - 1.0).abs() < 1e-12);
        assert_eq!(pearson(&[1.0; 12], &MAJOR_PROFILE), 0.0);
    }
}
