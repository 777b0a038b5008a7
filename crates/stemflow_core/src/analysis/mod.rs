//! Musical analysis: tempo and key of an audio file.
//!
//! The pipeline treats analysis as a black box behind the `Analyzer`
//! trait. The bundled `SpectralAnalyzer` is built from pure functions:
//!
//! 1. **Decoding** (`decoder`): ffmpeg pipes mono f32 PCM at 44.1 kHz.
//! 2. **Tempo** (`tempo`): spectral flux envelope + weighted autocorrelation.
//! 3. **Key** (`key`): chromagram + Krumhansl-Kessler profile matching.
//!
//! Audio that cannot be read surfaces as `AnalysisError` and the
//! orchestrator aborts the job, since later stages would fail on it too.
//! Readable audio always yields a report; an estimate the signal cannot
//! support (silence, a clip shorter than a few beats) is left empty.

mod decoder;
pub mod key;
mod spectrum;
pub mod tempo;
pub mod types;

use std::path::Path;

pub use decoder::{bytes_to_f32_samples, decode_audio, ANALYSIS_SAMPLE_RATE};
pub use key::{estimate_key, KeyEstimate, KEY_NAMES};
pub use tempo::{estimate_tempo, MAX_BPM, MIN_BPM};
pub use types::{
    AnalysisError, AnalysisReport, AnalysisResult, AudioBuffer, MusicalKey, Scale, NOT_AVAILABLE,
};

/// Tempo and key estimation backend.
pub trait Analyzer: Send + Sync {
    /// Analyze the audio file at `path`.
    fn analyze(&self, path: &Path) -> AnalysisResult<AnalysisReport>;

    /// Get the name of this analyzer (for logging).
    fn name(&self) -> &'static str;
}

/// Default analyzer: ffmpeg decode followed by spectral tempo and key estimation.
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    ffmpeg: String,
}

impl SpectralAnalyzer {
    pub fn new(ffmpeg: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Analyzer for SpectralAnalyzer {
    fn analyze(&self, path: &Path) -> AnalysisResult<AnalysisReport> {
        let buffer = decode_audio(&self.ffmpeg, path, ANALYSIS_SAMPLE_RATE)?;
        analyze_samples(&buffer)
    }

    fn name(&self) -> &'static str {
        "spectral"
    }
}

/// Analyze already-decoded audio.
///
/// Never fails: inconclusive estimates become `None`.
pub fn analyze_samples(buffer: &AudioBuffer) -> AnalysisResult<AnalysisReport> {
    if buffer.rms() < 1e-6 {
        tracing::debug!("Audio is silent, skipping tempo and key");
        return Ok(AnalysisReport::default());
    }

    let tempo_bpm = estimate_tempo(buffer)
        .map(|bpm| bpm.round().max(1.0) as u32)
        .map_err(|e| tracing::debug!("Tempo unavailable: {}", e))
        .ok();
    let key = estimate_key(buffer)
        .map(|k| MusicalKey::new(k.name(), k.scale))
        .map_err(|e| tracing::debug!("Key unavailable: {}", e))
        .ok();

    Ok(AnalysisReport { tempo_bpm, key })
}
