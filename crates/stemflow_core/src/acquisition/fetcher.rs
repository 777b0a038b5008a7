//! Network fetch collaborator.
//!
//! The default implementation drives the `yt-dlp` executable: one pass
//! to read the title and container extension of the best audio stream,
//! one pass to download it to a deterministic path.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::sanitize::sanitize_filename;
use crate::logging::JobLogger;
use crate::runner::{ProcessError, ProcessRunner, ToolCommand};

/// Stream selector: best audio-only stream, else best overall.
pub const BEST_AUDIO_FORMAT: &str = "bestaudio/best";

/// Fetcher failure.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The fetcher process failed (network error, unsupported URL, extraction failure).
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Metadata output could not be understood.
    #[error("Unexpected metadata from fetcher: {0}")]
    Metadata(String),

    /// The fetcher reported success but the file is not where expected.
    #[error("Downloaded file missing: {0}")]
    MissingDownload(PathBuf),
}

/// Audio downloaded by a fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAudio {
    /// Sanitized title.
    pub title: String,
    /// Location of the downloaded audio.
    pub path: PathBuf,
}

/// Downloads the best available audio for a URL.
pub trait Fetcher: Send + Sync {
    /// Download `url` into `dest_dir`.
    fn fetch(&self, url: &str, dest_dir: &Path, logger: &JobLogger) -> Result<FetchedAudio, FetchError>;

    /// Get the name of this fetcher (for logging).
    fn name(&self) -> &'static str;
}

/// `yt-dlp` backed fetcher.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: String,
    runner: ProcessRunner,
}

impl YtDlpFetcher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            runner: ProcessRunner::new(),
        }
    }

    fn metadata_command(&self, url: &str) -> ToolCommand {
        ToolCommand::new(&self.program).args([
            "--no-playlist",
            "--no-warnings",
            "-f",
            BEST_AUDIO_FORMAT,
            "--skip-download",
            "--print",
            "%(title)s",
            "--print",
            "%(ext)s",
            url,
        ])
    }

    fn download_command(&self, url: &str, dest_dir: &Path, title: &str) -> ToolCommand {
        // The output template treats `%` as a field marker.
        let template = dest_dir.join(format!("{}.%(ext)s", title.replace('%', "%%")));
        ToolCommand::new(&self.program)
            .args([
                "--no-playlist",
                "--no-warnings",
                "--no-part",
                "--newline",
                "-f",
                BEST_AUDIO_FORMAT,
                "-o",
            ])
            .path_arg(&template)
            .arg(url)
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl Fetcher for YtDlpFetcher {
    fn fetch(&self, url: &str, dest_dir: &Path, logger: &JobLogger) -> Result<FetchedAudio, FetchError> {
        let stdout = self.runner.capture(&self.metadata_command(url), logger)?;
        let (raw_title, ext) = parse_metadata(&stdout)?;
        let title = sanitize_filename(&raw_title);
        let path = dest_dir.join(format!("{}.{}", title, ext));

        logger.debug(&format!("Resolved '{}' -> {}", raw_title, path.display()));
        self.runner
            .run(&self.download_command(url, dest_dir, &title), 0, 0, logger)?;

        if !path.is_file() {
            return Err(FetchError::MissingDownload(path));
        }
        Ok(FetchedAudio { title, path })
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Parse the two `--print` lines (title, extension).
fn parse_metadata(stdout: &str) -> Result<(String, String), FetchError> {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
    let title = lines
        .next()
        .ok_or_else(|| FetchError::Metadata("no title printed".to_string()))?;
    let ext = lines
        .next()
        .ok_or_else(|| FetchError::Metadata(format!("no extension printed for '{}'", title)))?;

    if ext.contains(['/', '\\']) || ext.contains(char::is_whitespace) {
        return Err(FetchError::Metadata(format!("invalid extension '{}'", ext)));
    }
    Ok((title.to_string(), ext.to_string()))
}
