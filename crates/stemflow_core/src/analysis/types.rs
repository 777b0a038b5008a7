//! Core types for musical analysis.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Mono PCM audio decoded for analysis.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Samples in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new buffer from samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Get the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Root-mean-square level.
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum / self.samples.len() as f64).sqrt() as f32
    }
}

/// Musical mode of an estimated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Major,
    Minor,
}

impl Scale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Major => "major",
            Scale::Minor => "minor",
        }
    }
}

impl std::fmt::Display for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated key: tonic name plus scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicalKey {
    /// Key name, e.g. `"F#"`.
    pub name: String,
    pub scale: Scale,
}

impl MusicalKey {
    pub fn new(name: impl Into<String>, scale: Scale) -> Self {
        Self {
            name: name.into(),
            scale,
        }
    }
}

impl std::fmt::Display for MusicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.scale)
    }
}

/// Label logged when an estimate is unavailable.
pub const NOT_AVAILABLE: &str = "n/a";

/// Tempo and key of one track.
///
/// Informational only: the pipeline logs it and moves on. Either value
/// is `None` when decodable audio carries too little material to
/// estimate it (very short clips, silence).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Tempo rounded to the nearest whole BPM (positive when present).
    pub tempo_bpm: Option<u32>,
    pub key: Option<MusicalKey>,
}

impl AnalysisReport {
    pub fn new(tempo_bpm: u32, key: MusicalKey) -> Self {
        Self {
            tempo_bpm: Some(tempo_bpm),
            key: Some(key),
        }
    }

    /// `"128 BPM"`, or `"n/a"`.
    pub fn tempo_label(&self) -> String {
        self.tempo_bpm
            .map(|bpm| format!("{} BPM", bpm))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Key name and scale separated by a space, e.g. `"A minor"`, or `"n/a"`.
    pub fn key_label(&self) -> String {
        self.key
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

/// Error types for analysis operations.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Source file not found.
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The decoder could not read the audio.
    #[error("Could not decode audio: {0}")]
    Decode(String),

    /// The audio decoded but one estimate has too little to work with.
    /// `analyze_samples` turns this into a missing value, not a failure.
    #[error("Analysis inconclusive: {0}")]
    Inconclusive(String),
}

/// Type alias for analysis results.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_fall_back_when_missing() {
        let report = AnalysisReport::new(128, MusicalKey::new("F#", Scale::Minor));
        assert_eq!(report.key_label(), "F# minor");
        assert_eq!(report.tempo_label(), "128 BPM");

        let empty = AnalysisReport::default();
        assert_eq!(empty.key_label(), "n/a");
        assert_eq!(empty.tempo_label(), "n/a");
    }

    #[test]
    fn buffer_metrics() {
        let buffer = AudioBuffer::new(vec![0.5, -0.5, 0.5, -0.5], 4);
        assert_eq!(buffer.len(), 4);
        assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
        assert!((buffer.rms() - 0.5).abs() < 1e-6);
        assert_eq!(AudioBuffer::new(Vec::new(), 44100).rms(), 0.0);
    }

    #[test]
    fn report_serializes_scale_lowercase() {
        let report = AnalysisReport::new(90, MusicalKey::new("Eb", Scale::Major));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"scale\":\"major\""));
    }
}
