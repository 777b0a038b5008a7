//! Core types for the orchestrator pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use crate::acquisition::AcquiredSource;
use crate::analysis::AnalysisReport;
use crate::logging::JobLogger;
use crate::models::JobConfig;
use crate::tools::Toolchain;

/// Read-only context passed to pipeline steps.
///
/// Contains job configuration and shared resources that steps can read
/// but not modify. Mutable state goes in `JobState`.
pub struct Context {
    /// Job name/identifier.
    pub job_name: String,
    /// What to process and how.
    pub config: JobConfig,
    /// External collaborators.
    pub tools: Toolchain,
    /// Directory for downloaded inputs.
    pub temp_dir: PathBuf,
    /// Per-job logger (also the event emitter).
    pub logger: Arc<JobLogger>,
}

impl Context {
    /// Create a new context for a job.
    pub fn new(
        job_name: impl Into<String>,
        config: JobConfig,
        tools: Toolchain,
        temp_dir: PathBuf,
        logger: Arc<JobLogger>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            config,
            tools,
            temp_dir,
            logger,
        }
    }

    /// Output directory for the MP3 and stems.
    pub fn output_dir(&self) -> &std::path::Path {
        &self.config.output_dir
    }
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// Steps add their own section and leave earlier ones alone.
#[derive(Debug, Clone, Default)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// When the job started.
    pub started_at: Option<String>,
    /// Local input (from Acquire step).
    pub source: Option<AcquiredSource>,
    /// Tempo and key (from Analyze step).
    pub analysis: Option<AnalysisReport>,
    /// Transcoded MP3 (from Transcode step).
    pub mp3_path: Option<PathBuf>,
    /// Separated stems (from Separate step).
    pub stems: Option<StemOutput>,
}

impl JobState {
    /// Create a new job state with the given ID.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Temporary input owned by this job, if any.
    pub fn temporary_input(&self) -> Option<&std::path::Path> {
        self.source
            .as_ref()
            .filter(|s| s.is_temporary)
            .map(|s| s.path.as_path())
    }
}

/// Output from the Separate step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StemOutput {
    /// `<output>/<model>/<title>`.
    pub dir: PathBuf,
    /// Stem files found in `dir`, sorted.
    pub files: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_records_start_time() {
        let state = JobState::new("song-1");
        assert_eq!(state.job_id, "song-1");
        assert!(state.started_at.is_some());
        assert!(state.source.is_none());
    }

    #[test]
    fn only_downloaded_inputs_are_temporary() {
        let mut state = JobState::new("x");
        state.source = Some(AcquiredSource {
            title: "song".into(),
            path: PathBuf::from("/music/song.mp3"),
            is_temporary: false,
        });
        assert!(state.temporary_input().is_none());

        state.source = Some(AcquiredSource {
            title: "song".into(),
            path: PathBuf::from("/tmp/song.webm"),
            is_temporary: true,
        });
        assert_eq!(state.temporary_input(), Some(std::path::Path::new("/tmp/song.webm")));
    }
}
