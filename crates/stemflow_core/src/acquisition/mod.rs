//! Source acquisition: turn a job's input into a local audio file.
//!
//! Local inputs are validated in place. URLs are handed to a `Fetcher`
//! that downloads the best available audio into a temporary directory.
//! Either way, reaching the "input ready" checkpoint reports 10%.

mod fetcher;
mod sanitize;

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use fetcher::{FetchError, FetchedAudio, Fetcher, YtDlpFetcher, BEST_AUDIO_FORMAT};
pub use sanitize::sanitize_filename;

use crate::logging::JobLogger;
use crate::models::JobConfig;

/// Overall progress when acquisition starts (URL inputs only).
pub const ACQUIRE_START_PROGRESS: u32 = 0;
/// Overall progress once the input is available locally.
pub const ACQUIRE_DONE_PROGRESS: u32 = 10;

/// Acquisition failure.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// Local input does not exist (or is not a regular file).
    #[error("Input file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// The fetcher failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The temporary download directory is unusable.
    #[error("Cannot prepare temp directory {}: {source}", .path.display())]
    TempDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A job input available on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredSource {
    /// Filesystem-safe title, used to name outputs.
    pub title: String,
    /// Local audio path.
    pub path: PathBuf,
    /// True when the file was downloaded for this job and must be
    /// removed at cleanup. User-supplied files are never deleted.
    pub is_temporary: bool,
}

/// Resolves a job's `source` into an `AcquiredSource`.
pub struct SourceAcquirer<'a> {
    fetcher: &'a dyn Fetcher,
    temp_dir: PathBuf,
}

impl<'a> SourceAcquirer<'a> {
    /// Create an acquirer downloading into `temp_dir`.
    pub fn new(fetcher: &'a dyn Fetcher, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            temp_dir: temp_dir.into(),
        }
    }

    /// Temporary directory used for downloads.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Acquire the job input.
    ///
    /// Emits progress 10 on success, whichever path was taken.
    pub fn acquire(&self, config: &JobConfig, logger: &JobLogger) -> Result<AcquiredSource, AcquisitionError> {
        let source = if config.is_local_file {
            self.acquire_local(Path::new(&config.source), logger)?
        } else {
            self.acquire_remote(&config.source, logger)?
        };

        logger.progress(ACQUIRE_DONE_PROGRESS);
        Ok(source)
    }

    fn acquire_local(&self, path: &Path, logger: &JobLogger) -> Result<AcquiredSource, AcquisitionError> {
        if !path.is_file() {
            return Err(AcquisitionError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| sanitize_filename(""));

        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        logger.info(&format!("Using local file: {}", name));

        Ok(AcquiredSource {
            title,
            path: path.to_path_buf(),
            is_temporary: false,
        })
    }

    fn acquire_remote(&self, url: &str, logger: &JobLogger) -> Result<AcquiredSource, AcquisitionError> {
        logger.info("Fetching & downloading audio ...");
        logger.progress(ACQUIRE_START_PROGRESS);

        fs::create_dir_all(&self.temp_dir).map_err(|source| AcquisitionError::TempDir {
            path: self.temp_dir.clone(),
            source,
        })?;

        tracing::debug!("Fetching {} with {}", url, self.fetcher.name());
        let existing = files_in(&self.temp_dir);
        let fetched = match self.fetcher.fetch(url, &self.temp_dir, logger) {
            Ok(fetched) => fetched,
            Err(e) => {
                // An interrupted download leaves its file behind.
                for leftover in files_in(&self.temp_dir).difference(&existing) {
                    cleanup_input(leftover);
                }
                return Err(e.into());
            }
        };

        Ok(AcquiredSource {
            title: sanitize_filename(&fetched.title),
            path: fetched.path,
            is_temporary: true,
        })
    }
}

/// Regular files directly inside `dir`; empty if it cannot be read.
fn files_in(dir: &Path) -> HashSet<PathBuf> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect()
        })
        .unwrap_or_default()
}

/// Remove a temporary input file.
///
/// Idempotent: a missing file is fine. Other failures are logged via
/// `tracing` and swallowed; cleanup never fails a job.
pub fn cleanup_input(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed temporary input {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove temporary input {}: {}", path.display(), e),
    }
}
