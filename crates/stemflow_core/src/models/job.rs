//! Job configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::enums::{Bitrate, SeparationModel};

/// File extensions accepted as local audio input.
pub const SUPPORTED_AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "wav", "flac", "m4a"];

/// Immutable input to one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// URL or local file path.
    pub source: String,
    /// Whether `source` is a local file path.
    pub is_local_file: bool,
    /// Bitrate of the transcoded MP3.
    #[serde(default)]
    pub bitrate: Bitrate,
    /// Separation model.
    #[serde(default)]
    pub model: SeparationModel,
    /// Produce vocals + accompaniment only.
    #[serde(default)]
    pub two_stems: bool,
    /// Directory receiving the MP3 and the stems. Must exist and be writable.
    pub output_dir: PathBuf,
}

impl JobConfig {
    /// Create a config for a URL source with default bitrate and model.
    pub fn from_url(url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: url.into(),
            is_local_file: false,
            bitrate: Bitrate::default(),
            model: SeparationModel::default(),
            two_stems: false,
            output_dir: output_dir.into(),
        }
    }

    /// Create a config for a local audio file with default bitrate and model.
    pub fn from_file(path: impl AsRef<Path>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: path.as_ref().to_string_lossy().into_owned(),
            is_local_file: true,
            ..Self::from_url(String::new(), output_dir)
        }
    }

    /// Classify `source` the way the input box does: an existing regular
    /// file is a local input, anything else is treated as a URL.
    pub fn from_source(source: &str, output_dir: impl Into<PathBuf>) -> Self {
        let source = source.trim();
        if Path::new(source).is_file() {
            Self::from_file(source, output_dir)
        } else {
            Self::from_url(source, output_dir)
        }
    }

    /// Set the bitrate (builder pattern).
    pub fn with_bitrate(mut self, bitrate: Bitrate) -> Self {
        self.bitrate = bitrate;
        self
    }

    /// Set the model (builder pattern).
    pub fn with_model(mut self, model: SeparationModel) -> Self {
        self.model = model;
        self
    }

    /// Enable or disable two-stem mode (builder pattern).
    pub fn with_two_stems(mut self, two_stems: bool) -> Self {
        self.two_stems = two_stems;
        self
    }

    /// Short description used in the job banner.
    pub fn summary(&self) -> String {
        format!(
            "{} | {} | {}",
            self.bitrate,
            self.model,
            if self.two_stems { "2-stem" } else { "full" }
        )
    }
}

/// Whether `path` has one of the accepted local audio extensions.
pub fn is_supported_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}
