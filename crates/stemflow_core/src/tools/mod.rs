//! External tool collaborators and the bundle handed to a job.

mod separator;
mod transcoder;

pub use separator::{list_stems, DemucsSeparator, SeparationRequest, Separator, TWO_STEM_TARGET};
pub use transcoder::{mp3_output_path, FfmpegTranscoder, Transcoder, DEFAULT_MP3_CODEC};

use crate::acquisition::{Fetcher, YtDlpFetcher};
use crate::analysis::{Analyzer, SpectralAnalyzer};
use crate::config::ToolSettings;

/// The four collaborators a pipeline job drives.
///
/// Each is a trait object so tests can substitute fakes.
pub struct Toolchain {
    pub fetcher: Box<dyn Fetcher>,
    pub analyzer: Box<dyn Analyzer>,
    pub transcoder: Box<dyn Transcoder>,
    pub separator: Box<dyn Separator>,
}

impl Toolchain {
    /// Bundle explicit collaborators.
    pub fn new(
        fetcher: Box<dyn Fetcher>,
        analyzer: Box<dyn Analyzer>,
        transcoder: Box<dyn Transcoder>,
        separator: Box<dyn Separator>,
    ) -> Self {
        Self {
            fetcher,
            analyzer,
            transcoder,
            separator,
        }
    }

    /// The real tools (yt-dlp, ffmpeg, demucs) as configured.
    pub fn from_settings(tools: &ToolSettings) -> Self {
        Self::new(
            Box::new(YtDlpFetcher::new(&tools.yt_dlp)),
            Box::new(SpectralAnalyzer::new(&tools.ffmpeg)),
            Box::new(FfmpegTranscoder::new(&tools.ffmpeg, &tools.mp3_codec)),
            Box::new(DemucsSeparator::new(&tools.separator)),
        )
    }

    /// One-line summary for logs.
    pub fn describe(&self) -> String {
        format!(
            "fetch={} analyze={} transcode={} separate={}",
            self.fetcher.name(),
            self.analyzer.name(),
            self.transcoder.name(),
            self.separator.name()
        )
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::from_settings(&ToolSettings::default())
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("fetcher", &self.fetcher.name())
            .field("analyzer", &self.analyzer.name())
            .field("transcoder", &self.transcoder.name())
            .field("separator", &self.separator.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toolchain_uses_real_tools() {
        let tools = Toolchain::default();
        assert_eq!(
            tools.describe(),
            "fetch=yt-dlp analyze=spectral transcode=ffmpeg separate=demucs"
        );
    }
}
