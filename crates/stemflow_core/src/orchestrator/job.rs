//! One pipeline run from configuration to terminal event.
//!
//! `PipelineJob` owns everything a run needs: it builds the logger that
//! emits the job's events, checks the output directory, drives the
//! standard pipeline, removes the temporary input and emits the single
//! terminal event. Nothing is raised to the caller; every failure ends up
//! in `Terminal(success = false)`.

use std::path::Path;
use std::sync::Arc;

use chrono::Local;

use super::errors::PipelineError;
use super::pipeline::CancelHandle;
use super::types::{Context, JobState};
use super::create_standard_pipeline;
use crate::acquisition::cleanup_input;
use crate::config::Settings;
use crate::logging::JobLogger;
use crate::models::{JobConfig, JobEvent, JobObserver};
use crate::tools::Toolchain;

/// Terminal message of a successful job.
pub const SUCCESS_MESSAGE: &str = "Finished - stems ready";

/// Job name used for URL sources before the title is known.
const FETCH_JOB_NAME: &str = "fetch";

/// Final result of a job, mirroring its terminal event.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Whether the job succeeded.
    pub success: bool,
    /// Terminal message sent to the observer.
    pub message: String,
    /// Whatever the steps recorded before the job ended.
    pub state: JobState,
}

/// A single pipeline run.
///
/// Created per run and consumed by `run`.
pub struct PipelineJob {
    config: JobConfig,
    settings: Settings,
    tools: Toolchain,
    cancel: CancelHandle,
}

impl PipelineJob {
    /// Create a job with explicit collaborators.
    pub fn new(config: JobConfig, settings: Settings, tools: Toolchain) -> Self {
        Self {
            config,
            settings,
            tools,
            cancel: CancelHandle::new(),
        }
    }

    /// Create a job using the real tools from `settings`.
    pub fn with_settings(config: JobConfig, settings: Settings) -> Self {
        let tools = Toolchain::from_settings(&settings.tools);
        Self::new(config, settings, tools)
    }

    /// Handle that stops the job at the next stage boundary.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Name used for the job's log file and log context.
    pub fn job_name(&self) -> String {
        if self.config.is_local_file {
            Path::new(&self.config.source)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| FETCH_JOB_NAME.to_string())
        } else {
            FETCH_JOB_NAME.to_string()
        }
    }

    /// Run the job to completion on the calling thread.
    ///
    /// Emits the job's events to `observer`, ending with exactly one
    /// `Terminal` event.
    pub fn run(self, observer: Box<dyn JobObserver>) -> JobOutcome {
        let job_name = self.job_name();
        let job_id = format!("{}-{}", job_name, Local::now().format("%Y%m%d-%H%M%S"));
        let logger = Arc::new(self.create_logger(&job_name, observer));

        logger.info(&format!("New job ({})", self.config.summary()));
        tracing::info!(job = %job_name, tools = %self.tools.describe(), "Starting job");

        if let Err(e) = check_output_dir(&job_name, &self.config.output_dir) {
            return finish(&logger, JobState::new(job_id), Err(e));
        }

        let temp_dir = self.settings.paths.temp_dir();
        let pipeline = create_standard_pipeline().with_cancel_handle(self.cancel);
        let ctx = Context::new(job_name, self.config, self.tools, temp_dir, Arc::clone(&logger));

        // Past the last checkpoint only `finish` may reach the observer,
        // so diagnostics from here on go to tracing.
        let mut state = JobState::new(job_id);
        let result = pipeline.run(&ctx, &mut state).map(|run| {
            tracing::debug!(job = %ctx.job_name, "{} steps completed", run.total_steps());
        });

        if let Some(path) = state.temporary_input() {
            cleanup_input(path);
        }

        finish(&logger, state, result)
    }

    /// Logger writing to a per-job file when enabled, falling back to
    /// events only if the file cannot be created.
    fn create_logger(&self, job_name: &str, observer: Box<dyn JobObserver>) -> JobLogger {
        let log_config = self.settings.logging.to_log_config();
        let observer: Arc<dyn JobObserver> = Arc::from(observer);

        if self.settings.logging.write_job_log {
            let log_dir = Path::new(&self.settings.paths.logs_folder);
            match JobLogger::new(job_name, Some(log_dir), log_config.clone(), forward(&observer)) {
                Ok(logger) => return logger,
                Err(e) => tracing::warn!(
                    "Cannot create job log in {}: {}",
                    log_dir.display(),
                    e
                ),
            }
        }
        JobLogger::without_file(job_name, log_config, forward(&observer))
    }
}

fn forward(observer: &Arc<dyn JobObserver>) -> Box<dyn JobObserver> {
    let observer = Arc::clone(observer);
    Box::new(move |event: JobEvent| observer.on_event(event))
}

/// The output directory must exist and accept new files.
fn check_output_dir(job_name: &str, dir: &Path) -> Result<(), PipelineError> {
    if !dir.is_dir() {
        return Err(PipelineError::validation_failed(
            job_name,
            format!("Output directory does not exist: {}", dir.display()),
        ));
    }

    tempfile::Builder::new()
        .prefix(".stemflow-")
        .tempfile_in(dir)
        .map(drop)
        .map_err(|e| {
            PipelineError::validation_failed(
                job_name,
                format!("Output directory is not writable: {} ({})", dir.display(), e),
            )
        })
}

fn finish(logger: &JobLogger, state: JobState, result: Result<(), PipelineError>) -> JobOutcome {
    let (success, message) = match result {
        Ok(()) => (true, SUCCESS_MESSAGE.to_string()),
        Err(e) => {
            tracing::error!("{}", e);
            (false, format!("Error: {}", e))
        }
    };

    logger.finish(success, &message);
    JobOutcome {
        success,
        message,
        state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{channel_observer, Bitrate, SeparationModel, MODEL_CATALOG};
    use crate::orchestrator::testing::{
        fake_toolchain, local_song, FakeAnalyzer, FakeFetcher, FakeSeparator, FakeTranscoder,
    };
    use std::sync::mpsc;
    use tempfile::tempdir;

    fn quiet_settings() -> Settings {
        let mut settings = Settings::default();
        settings.logging.write_job_log = false;
        settings
    }

    fn run_job(job: PipelineJob) -> (JobOutcome, Vec<JobEvent>) {
        let (tx, rx) = mpsc::channel();
        let outcome = job.run(Box::new(channel_observer(tx)));
        (outcome, rx.try_iter().collect())
    }

    fn progress(events: &[JobEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                JobEvent::Progress { percent } => Some(*percent),
                _ => None,
            })
            .collect()
    }

    fn assert_single_terminal_last(events: &[JobEvent]) {
        let terminals = events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminals, 1);
        assert!(events.last().map(JobEvent::is_terminal).unwrap_or(false));
    }

    #[test]
    fn local_job_reaches_all_checkpoints() {
        let dir = tempdir().unwrap();
        let song = local_song(dir.path());
        let config = JobConfig::from_file(&song, dir.path());

        let (outcome, events) =
            run_job(PipelineJob::new(config, quiet_settings(), fake_toolchain()));

        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.message, SUCCESS_MESSAGE);
        assert_eq!(progress(&events), vec![10, 40, 75, 100]);
        assert_single_terminal_last(&events);

        // Progress(100) comes immediately before the terminal event.
        let n = events.len();
        assert_eq!(events[n - 2], JobEvent::Progress { percent: 100 });
        assert!(matches!(&events[n - 1], JobEvent::Terminal { success: true, .. }));

        assert_eq!(
            events.first(),
            Some(&JobEvent::LogLine {
                text: "New job (320 kbps | htdemucs | full)".into()
            })
        );
        assert!(dir.path().join("My Song_320k.mp3").is_file());
        assert_eq!(outcome.state.stems.unwrap().files.len(), 4);
        // Local inputs are never deleted.
        assert!(song.exists());
    }

    #[test]
    fn every_option_combination_ends_with_single_100_then_terminal() {
        for bitrate in Bitrate::ALL {
            for info in MODEL_CATALOG.iter() {
                for two_stems in [false, true] {
                    let dir = tempdir().unwrap();
                    let config = JobConfig::from_file(local_song(dir.path()), dir.path())
                        .with_bitrate(bitrate)
                        .with_model(info.model)
                        .with_two_stems(two_stems);
                    let mut tools = fake_toolchain();
                    tools.separator = Box::new(FakeSeparator {
                        stems: info.model.stem_count(two_stems),
                        fail: false,
                    });
                    let combo = format!("{} / {} / two_stems={}", bitrate, info.id, two_stems);

                    let (outcome, events) =
                        run_job(PipelineJob::new(config, quiet_settings(), tools));

                    assert!(outcome.success, "{}: {}", combo, outcome.message);
                    let values = progress(&events);
                    assert!(values.windows(2).all(|w| w[0] <= w[1]), "{}: {:?}", combo, values);
                    assert_eq!(values.iter().filter(|&&p| p == 100).count(), 1, "{}", combo);

                    let n = events.len();
                    assert_eq!(events[n - 2], JobEvent::Progress { percent: 100 }, "{}", combo);
                    assert!(
                        matches!(&events[n - 1], JobEvent::Terminal { success: true, .. }),
                        "{}",
                        combo
                    );
                    assert_single_terminal_last(&events);
                    assert!(dir
                        .path()
                        .join(format!("My Song_{}k.mp3", bitrate.kbps()))
                        .is_file());
                }
            }
        }
    }

    #[test]
    fn url_job_removes_downloaded_input() {
        let dir = tempdir().unwrap();
        let mut settings = quiet_settings();
        settings.paths.temp_root = dir.path().join("tmp").display().to_string();
        let config = JobConfig::from_url("https://example.com/v/1", dir.path())
            .with_model(SeparationModel::Mdx)
            .with_two_stems(true);
        let mut tools = fake_toolchain();
        tools.separator = Box::new(FakeSeparator { stems: 2, fail: false });

        let (outcome, events) = run_job(PipelineJob::new(config, settings, tools));

        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(progress(&events), vec![0, 10, 40, 75, 100]);
        let source = outcome.state.source.unwrap();
        assert!(source.is_temporary);
        assert!(!source.path.exists());
        assert!(dir.path().join("mdx").join("Remote Song").is_dir());
    }

    #[test]
    fn missing_local_file_fails_before_any_progress() {
        let dir = tempdir().unwrap();
        let config = JobConfig::from_file(dir.path().join("absent.mp3"), dir.path());

        let (outcome, events) =
            run_job(PipelineJob::new(config, quiet_settings(), fake_toolchain()));

        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Error: "));
        assert!(outcome.message.contains("absent.mp3"));
        assert!(progress(&events).is_empty());
        assert_single_terminal_last(&events);
    }

    #[test]
    fn transcoder_failure_reports_its_arguments() {
        let dir = tempdir().unwrap();
        let config = JobConfig::from_file(local_song(dir.path()), dir.path());
        let mut tools = fake_toolchain();
        tools.transcoder = Box::new(FakeTranscoder { fail: true });

        let (outcome, events) = run_job(PipelineJob::new(config, quiet_settings(), tools));

        assert!(!outcome.success);
        assert!(outcome.message.contains("Transcode"));
        assert!(outcome.message.contains("-b:a 320k"));
        assert_eq!(progress(&events), vec![10]);
        match events.last() {
            Some(JobEvent::Terminal { success, message }) => {
                assert!(!success);
                assert_eq!(message, &outcome.message);
            }
            other => panic!("expected terminal event, got {:?}", other),
        }
    }

    #[test]
    fn failed_url_job_still_cleans_up() {
        let dir = tempdir().unwrap();
        let mut settings = quiet_settings();
        settings.paths.temp_root = dir.path().join("tmp").display().to_string();
        let config = JobConfig::from_url("https://example.com/v/1", dir.path());
        let mut tools = fake_toolchain();
        tools.separator = Box::new(FakeSeparator { stems: 4, fail: true });

        let (outcome, events) = run_job(PipelineJob::new(config, settings, tools));

        assert!(!outcome.success);
        assert!(!outcome.state.source.unwrap().path.exists());
        assert_single_terminal_last(&events);
    }

    #[test]
    fn interrupted_download_leaves_no_file() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join("tmp");
        let mut settings = quiet_settings();
        settings.paths.temp_root = temp.display().to_string();
        let config = JobConfig::from_url("https://example.com/v/1", dir.path());
        let mut tools = fake_toolchain();
        tools.fetcher = Box::new(FakeFetcher {
            fail: true,
            partial: true,
            ..Default::default()
        });

        let (outcome, events) = run_job(PipelineJob::new(config, settings, tools));

        assert!(!outcome.success);
        assert!(outcome.state.source.is_none());
        assert!(!temp.join("Remote Song.webm").exists());
        assert_single_terminal_last(&events);
    }

    #[test]
    fn analysis_failure_aborts_job() {
        let dir = tempdir().unwrap();
        let config = JobConfig::from_file(local_song(dir.path()), dir.path());
        let mut tools = fake_toolchain();
        tools.analyzer = Box::new(FakeAnalyzer {
            fail: true,
            ..Default::default()
        });

        let (outcome, _events) = run_job(PipelineJob::new(config, quiet_settings(), tools));

        assert!(!outcome.success);
        assert!(outcome.message.contains("Analyze"));
        assert!(outcome.state.mp3_path.is_none());
    }

    #[test]
    fn inconclusive_analysis_still_produces_stems() {
        let dir = tempdir().unwrap();
        let config = JobConfig::from_file(local_song(dir.path()), dir.path());
        let mut tools = fake_toolchain();
        tools.analyzer = Box::new(FakeAnalyzer {
            inconclusive: true,
            ..Default::default()
        });

        let (outcome, events) = run_job(PipelineJob::new(config, quiet_settings(), tools));

        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(progress(&events), vec![10, 40, 75, 100]);
        assert!(events.contains(&JobEvent::LogLine {
            text: "Detected tempo: n/a".into()
        }));
        assert_eq!(outcome.state.stems.unwrap().files.len(), 4);
    }

    #[test]
    fn fetch_failure_is_reported() {
        let dir = tempdir().unwrap();
        let mut settings = quiet_settings();
        settings.paths.temp_root = dir.path().join("tmp").display().to_string();
        let config = JobConfig::from_url("https://example.com/v/404", dir.path());
        let mut tools = fake_toolchain();
        tools.fetcher = Box::new(FakeFetcher {
            fail: true,
            ..Default::default()
        });

        let (outcome, events) = run_job(PipelineJob::new(config, settings, tools));

        assert!(!outcome.success);
        assert!(outcome.message.contains("yt-dlp https://example.com/v/404"));
        assert_eq!(progress(&events), vec![0]);
    }

    #[test]
    fn missing_output_dir_fails_validation() {
        let dir = tempdir().unwrap();
        let config = JobConfig::from_file(local_song(dir.path()), dir.path().join("nope"));

        let (outcome, events) =
            run_job(PipelineJob::new(config, quiet_settings(), fake_toolchain()));

        assert!(!outcome.success);
        assert!(outcome.message.contains("Output directory does not exist"));
        assert!(outcome.state.source.is_none());
        assert_single_terminal_last(&events);
    }

    #[cfg(unix)]
    #[test]
    fn read_only_output_dir_fails_validation() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        std::fs::set_permissions(&out, std::fs::Permissions::from_mode(0o555)).unwrap();
        // Root ignores directory permissions.
        if tempfile::tempfile_in(&out).is_ok() {
            return;
        }

        let config = JobConfig::from_file(local_song(dir.path()), &out);
        let (outcome, _events) =
            run_job(PipelineJob::new(config, quiet_settings(), fake_toolchain()));

        std::fs::set_permissions(&out, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("not writable"));
    }

    #[test]
    fn cancelled_job_ends_with_failure() {
        let dir = tempdir().unwrap();
        let config = JobConfig::from_file(local_song(dir.path()), dir.path());
        let job = PipelineJob::new(config, quiet_settings(), fake_toolchain());
        job.cancel_handle().cancel();

        let (outcome, events) = run_job(job);

        assert!(!outcome.success);
        assert_eq!(outcome.message, "Error: Job 'My Song' was cancelled");
        assert!(progress(&events).is_empty());
        assert_single_terminal_last(&events);
    }

    #[test]
    fn job_log_file_is_written() {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.paths.logs_folder = dir.path().join("logs").display().to_string();
        let config = JobConfig::from_file(local_song(dir.path()), dir.path());

        let (outcome, _events) = run_job(PipelineJob::new(config, settings, fake_toolchain()));
        assert!(outcome.success);

        let logs: Vec<_> = std::fs::read_dir(dir.path().join("logs"))
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(logs.len(), 1);
        let content = std::fs::read_to_string(logs[0].path()).unwrap();
        assert!(content.contains("Detected tempo: 128 BPM"));
        assert!(content.contains(SUCCESS_MESSAGE));
    }

    #[test]
    fn job_name_follows_source() {
        let local = PipelineJob::with_settings(
            JobConfig::from_file("/music/Track One.flac", "/out"),
            Settings::default(),
        );
        assert_eq!(local.job_name(), "Track One");

        let remote = PipelineJob::with_settings(
            JobConfig::from_url("https://example.com", "/out"),
            Settings::default(),
        );
        assert_eq!(remote.job_name(), "fetch");
    }
}
