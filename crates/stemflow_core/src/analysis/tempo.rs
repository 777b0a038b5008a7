//! Tempo estimation.
//!
//! Algorithm:
//! 1. Spectral flux onset envelope (log-compressed magnitudes, half-wave
//!    rectified frame differences, summed across bins)
//! 2. Unbiased autocorrelation of the zero-mean envelope over the lags
//!    covering 60-200 BPM
//! 3. Log-Gaussian tempo prior centred on 120 BPM to settle octave ambiguity
//! 4. Parabolic interpolation around the winning lag

use crate::analysis::spectrum::for_each_magnitude_frame;
use crate::analysis::types::{AnalysisError, AnalysisResult, AudioBuffer};

/// FFT size for the onset envelope.
const ONSET_FFT: usize = 1024;
/// Hop between envelope frames.
pub const ONSET_HOP: usize = 512;

/// Slowest tempo considered.
pub const MIN_BPM: f64 = 60.0;
/// Fastest tempo considered.
pub const MAX_BPM: f64 = 200.0;

const PRIOR_CENTER_BPM: f64 = 120.0;
/// Prior width in octaves.
const PRIOR_SIGMA_OCTAVES: f64 = 1.0;

/// Compute the spectral flux onset envelope (one value per hop).
pub fn onset_envelope(samples: &[f32]) -> Vec<f32> {
    let mut envelope = Vec::new();
    let mut previous: Vec<f32> = Vec::new();

    for_each_magnitude_frame(samples, ONSET_FFT, ONSET_HOP, |_, mags| {
        let compressed: Vec<f32> = mags.iter().map(|m| m.ln_1p()).collect();

        let flux = if previous.is_empty() {
            0.0
        } else {
            compressed
                .iter()
                .zip(&previous)
                .map(|(cur, prev)| (cur - prev).max(0.0))
                .sum()
        };

        envelope.push(flux);
        previous = compressed;
    });

    envelope
}

/// Estimate the tempo of `buffer` in BPM.
pub fn estimate_tempo(buffer: &AudioBuffer) -> AnalysisResult<f64> {
    let frame_rate = buffer.sample_rate as f64 / ONSET_HOP as f64;
    let min_lag = ((60.0 * frame_rate / MAX_BPM).floor() as usize).max(2);
    let max_lag = (60.0 * frame_rate / MIN_BPM).ceil() as usize;

    let envelope = onset_envelope(&buffer.samples);
    if envelope.len() < 2 * max_lag {
        return Err(AnalysisError::Inconclusive(format!(
            "{:.1}s of audio is too short to estimate tempo",
            buffer.duration_secs()
        )));
    }

    let mean = envelope.iter().map(|&v| v as f64).sum::<f64>() / envelope.len() as f64;
    let centered: Vec<f64> = envelope.iter().map(|&v| v as f64 - mean).collect();

    let energy: f64 = centered.iter().map(|v| v * v).sum();
    if energy <= 1e-9 {
        return Err(AnalysisError::Inconclusive("no rhythmic onsets detected".to_string()));
    }

    let score = |lag: usize| -> f64 {
        let n = centered.len() - lag;
        let ac: f64 = centered[..n]
            .iter()
            .zip(&centered[lag..])
            .map(|(a, b)| a * b)
            .sum();
        (ac / n as f64) * tempo_prior(60.0 * frame_rate / lag as f64)
    };

    let (best_lag, best_score) = (min_lag..=max_lag)
        .map(|lag| (lag, score(lag)))
        .fold((0, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });

    if best_lag == 0 || best_score <= 0.0 {
        return Err(AnalysisError::Inconclusive("no periodic beat found".to_string()));
    }

    let delta = parabolic_offset(score(best_lag - 1), best_score, score(best_lag + 1));
    let bpm = 60.0 * frame_rate / (best_lag as f64 + delta);

    tracing::debug!(
        "Tempo: lag {} (+{:.3}) frames at {:.2} fps -> {:.2} BPM",
        best_lag,
        delta,
        frame_rate,
        bpm
    );
    Ok(bpm)
}

/// Log-Gaussian weight of a candidate tempo.
fn tempo_prior(bpm: f64) -> f64 {
    let octaves = (bpm / PRIOR_CENTER_BPM).log2() / PRIOR_SIGMA_OCTAVES;
    (-0.5 * octaves * octaves).exp()
}

/// Sub-lag offset of a parabola's vertex through three neighbouring points.
fn parabolic_offset(y0: f64, y1: f64, y2: f64) -> f64 {
    let denom = y0 - 2.0 * y1 + y2;
    if denom.abs() < 1e-12 {
        return 0.0;
    }
    (0.5 * (y0 - y2) / denom).clamp(-0.5, 0.5)
}
