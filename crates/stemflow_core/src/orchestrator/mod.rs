//! Pipeline orchestrator for coordinating job execution.
//!
//! This module provides the infrastructure for running a job through its
//! stages. Each stage is a pipeline step that validates, executes, and
//! records its results in the shared job state.
//!
//! # Architecture
//!
//! ```text
//! JobWorker (dedicated thread, one job at a time)
//!     └── PipelineJob (logger, output dir check, cleanup, terminal event)
//!             └── Pipeline
//!                     ├── Step: Acquire    (progress 0, 10)
//!                     ├── Step: Analyze
//!                     ├── Step: Transcode  (checkpoint 40)
//!                     └── Step: Separate   (50..=100, checkpoint 100)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use stemflow_core::config::Settings;
//! use stemflow_core::models::{JobConfig, JobEvent};
//! use stemflow_core::orchestrator::{JobWorker, PipelineJob};
//!
//! let config = JobConfig::from_source("song.mp3", ".");
//! let job = PipelineJob::with_settings(config, Settings::default());
//!
//! let worker = JobWorker::new();
//! let handle = worker
//!     .submit(job, Box::new(|event: JobEvent| println!("{:?}", event)))
//!     .unwrap();
//! let outcome = handle.join().unwrap();
//! println!("{}", outcome.message);
//! ```

mod errors;
mod job;
mod pipeline;
mod step;
pub mod steps;
mod types;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use job::{JobOutcome, PipelineJob, SUCCESS_MESSAGE};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use steps::{AcquireStep, AnalyzeStep, SeparateStep, TranscodeStep};
pub use types::{Context, JobState, StemOutput};
pub use worker::{JobHandle, JobWorker, WorkerError};

/// Create a standard pipeline with all steps in the correct order.
///
/// The standard pipeline executes these steps:
/// 1. Acquire - validate the local file or download the URL's audio
/// 2. Analyze - estimate tempo and key (logged only)
/// 3. Transcode - write `<title>_<kbps>k.mp3` to the output directory
/// 4. Separate - split the MP3 into stems under `<output>/<model>/<title>`
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(AcquireStep::new())
        .with_step(AnalyzeStep::new())
        .with_step(TranscodeStep::new())
        .with_step(SeparateStep::new())
}
