//! MP3 transcoding collaborator.

use std::path::{Path, PathBuf};

use crate::logging::JobLogger;
use crate::models::Bitrate;
use crate::runner::{ProcessError, ProcessRunner, ProgressRange, ToolCommand};

/// Default MP3 encoder.
pub const DEFAULT_MP3_CODEC: &str = "libmp3lame";

/// Converts an audio file to MP3 at a fixed bitrate.
pub trait Transcoder: Send + Sync {
    /// Transcode `input` into `output`.
    ///
    /// Tool percentages are mapped into `progress`.
    fn transcode(
        &self,
        input: &Path,
        output: &Path,
        bitrate: Bitrate,
        progress: ProgressRange,
        logger: &JobLogger,
    ) -> Result<(), ProcessError>;

    /// Get the name of this transcoder (for logging).
    fn name(&self) -> &'static str;
}

/// MP3 path for a track: `<dir>/<title>_<kbps>k.mp3`.
pub fn mp3_output_path(output_dir: &Path, title: &str, bitrate: Bitrate) -> PathBuf {
    output_dir.join(format!("{}_{}k.mp3", title, bitrate.kbps()))
}

/// `ffmpeg` backed transcoder.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
    codec: String,
    runner: ProcessRunner,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>, codec: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            codec: codec.into(),
            runner: ProcessRunner::new(),
        }
    }

    /// `<ffmpeg> -y -i <input> -vn -c:a <codec> -b:a <N>k <output>`
    pub fn build_command(&self, input: &Path, output: &Path, bitrate: Bitrate) -> ToolCommand {
        ToolCommand::new(&self.program)
            .args(["-y", "-i"])
            .path_arg(input)
            .args(["-vn", "-c:a", self.codec.as_str(), "-b:a", bitrate.encoder_arg().as_str()])
            .path_arg(output)
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", DEFAULT_MP3_CODEC)
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(
        &self,
        input: &Path,
        output: &Path,
        bitrate: Bitrate,
        progress: ProgressRange,
        logger: &JobLogger,
    ) -> Result<(), ProcessError> {
        let cmd = self.build_command(input, output, bitrate);
        self.runner.run(&cmd, progress.offset, progress.span, logger)
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mp3_name_carries_bitrate() {
        let path = mp3_output_path(Path::new("/out"), "song", Bitrate::Kbps192);
        assert_eq!(path, PathBuf::from("/out/song_192k.mp3"));
    }

    #[test]
    fn builds_ffmpeg_command_line() {
        let cmd = FfmpegTranscoder::default().build_command(
            Path::new("/tmp/in.webm"),
            Path::new("/out/song_320k.mp3"),
            Bitrate::Kbps320,
        );
        assert_eq!(
            cmd.to_string(),
            "ffmpeg -y -i /tmp/in.webm -vn -c:a libmp3lame -b:a 320k /out/song_320k.mp3"
        );
    }

    #[test]
    fn custom_program_and_codec() {
        let cmd = FfmpegTranscoder::new("/usr/local/bin/ffmpeg", "libshine").build_command(
            Path::new("a.wav"),
            Path::new("a_96k.mp3"),
            Bitrate::Kbps96,
        );
        assert_eq!(cmd.program(), "/usr/local/bin/ffmpeg");
        assert!(cmd.get_args().iter().any(|a| a == "libshine"));
        assert!(cmd.get_args().iter().any(|a| a == "96k"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_reports_arguments() {
        use crate::logging::LogConfig;
        use crate::models::channel_observer;

        let (tx, _rx) = std::sync::mpsc::channel();
        let logger = JobLogger::without_file("t", LogConfig::default(), Box::new(channel_observer(tx)));
        let transcoder = FfmpegTranscoder::new("false", DEFAULT_MP3_CODEC);

        let err = transcoder
            .transcode(
                Path::new("in.wav"),
                Path::new("out_320k.mp3"),
                Bitrate::Kbps320,
                ProgressRange::NONE,
                &logger,
            )
            .unwrap_err();

        assert_eq!(err.exit_code(), Some(1));
        assert!(err.to_string().contains("-b:a 320k out_320k.mp3"));
    }
}
