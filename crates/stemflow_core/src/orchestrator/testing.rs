//! Fake collaborators shared by the orchestrator tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use tempfile::TempDir;

use super::types::Context;
use crate::acquisition::{FetchError, FetchedAudio, Fetcher};
use crate::analysis::{AnalysisError, AnalysisReport, AnalysisResult, Analyzer, MusicalKey, Scale};
use crate::logging::{JobLogger, LogConfig};
use crate::models::{channel_observer, Bitrate, JobConfig, JobEvent};
use crate::runner::{scale_progress, ProcessError, ProgressRange};
use crate::tools::{SeparationRequest, Separator, Toolchain, Transcoder};

/// Writes a small file named after the title into the destination.
#[derive(Default)]
pub struct FakeFetcher {
    pub fail: bool,
    /// With `fail`, write the file first as an interrupted download would.
    pub partial: bool,
    pub calls: Arc<AtomicUsize>,
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, url: &str, dest_dir: &Path, _logger: &JobLogger) -> Result<FetchedAudio, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = dest_dir.join("Remote Song.webm");
        if self.fail && self.partial {
            fs::write(&path, b"we").map_err(|_| FetchError::MissingDownload(path.clone()))?;
        }
        if self.fail {
            return Err(ProcessError::Failed {
                command: format!("yt-dlp {}", url),
                exit_code: Some(1),
            }
            .into());
        }
        fs::write(&path, b"webm").map_err(|_| FetchError::MissingDownload(path.clone()))?;
        Ok(FetchedAudio {
            title: "Remote Song".into(),
            path,
        })
    }

    fn name(&self) -> &'static str {
        "fake-fetch"
    }
}

/// Returns a fixed report, or fails.
#[derive(Default)]
pub struct FakeAnalyzer {
    pub fail: bool,
    /// Readable audio with nothing to estimate.
    pub inconclusive: bool,
}

impl Analyzer for FakeAnalyzer {
    fn analyze(&self, path: &Path) -> AnalysisResult<AnalysisReport> {
        if self.fail {
            return Err(AnalysisError::Decode(format!("cannot decode {}", path.display())));
        }
        if self.inconclusive {
            return Err(AnalysisError::Inconclusive("1.5s of audio is too short".into()));
        }
        Ok(AnalysisReport::new(128, MusicalKey::new("A", Scale::Minor)))
    }

    fn name(&self) -> &'static str {
        "fake-analyze"
    }
}

/// Copies the input to the output, or fails like ffmpeg would.
#[derive(Default)]
pub struct FakeTranscoder {
    pub fail: bool,
}

impl Transcoder for FakeTranscoder {
    fn transcode(
        &self,
        input: &Path,
        output: &Path,
        bitrate: Bitrate,
        _progress: ProgressRange,
        logger: &JobLogger,
    ) -> Result<(), ProcessError> {
        let command = format!(
            "ffmpeg -y -i {} -vn -c:a libmp3lame -b:a {} {}",
            input.display(),
            bitrate.encoder_arg(),
            output.display()
        );
        if self.fail {
            logger.output_line("Unknown encoder 'libmp3lame'");
            return Err(ProcessError::Failed {
                command,
                exit_code: Some(1),
            });
        }
        fs::copy(input, output).map_err(|source| ProcessError::Io { command, source })?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake-transcode"
    }
}

/// Writes `stems` empty wav files, reporting half-way progress.
pub struct FakeSeparator {
    pub stems: usize,
    pub fail: bool,
}

impl Default for FakeSeparator {
    fn default() -> Self {
        Self { stems: 4, fail: false }
    }
}

impl Separator for FakeSeparator {
    fn separate(
        &self,
        request: &SeparationRequest<'_>,
        progress: ProgressRange,
        logger: &JobLogger,
    ) -> Result<PathBuf, ProcessError> {
        let command = format!("demucs {}", request.input.display());
        if self.fail {
            return Err(ProcessError::Failed {
                command,
                exit_code: Some(2),
            });
        }
        logger.progress(scale_progress(progress.offset, progress.span, 50));

        let dir = request.stem_dir();
        fs::create_dir_all(&dir).map_err(|source| ProcessError::Io {
            command: command.clone(),
            source,
        })?;
        for name in ["vocals", "drums", "bass", "other", "guitar", "piano"]
            .iter()
            .take(self.stems)
        {
            fs::write(dir.join(format!("{}.wav", name)), b"RIFF").map_err(|source| {
                ProcessError::Io {
                    command: command.clone(),
                    source,
                }
            })?;
        }
        Ok(dir)
    }

    fn name(&self) -> &'static str {
        "fake-separate"
    }
}

/// Toolchain made entirely of fakes that succeed.
pub fn fake_toolchain() -> Toolchain {
    Toolchain::new(
        Box::new(FakeFetcher::default()),
        Box::new(FakeAnalyzer::default()),
        Box::new(FakeTranscoder::default()),
        Box::new(FakeSeparator::default()),
    )
}

/// Write a small local "audio" file and return its path.
pub fn local_song(dir: &Path) -> PathBuf {
    let path = dir.join("My Song.wav");
    fs::write(&path, b"RIFF").expect("write local song");
    path
}

/// Context over fakes with a channel-backed logger.
///
/// The config points at a local song inside the returned temp dir.
pub fn test_context() -> (Context, Receiver<JobEvent>, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = JobConfig::from_file(local_song(dir.path()), dir.path());
    let (tx, rx) = mpsc::channel();
    let logger = JobLogger::without_file("test", LogConfig::default(), Box::new(channel_observer(tx)));
    let ctx = Context::new(
        "test",
        config,
        fake_toolchain(),
        dir.path().join("tmp"),
        Arc::new(logger),
    );
    (ctx, rx, dir)
}
