//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Job → Step → Collaborator → Detail

use std::io;

use thiserror::Error;

use crate::acquisition::AcquisitionError;
use crate::analysis::AnalysisError;
use crate::runner::ProcessError;

/// Top-level pipeline error with job context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Job '{job_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Preconditions checked before the first step were not met.
    #[error("Job '{job_name}' failed validation: {message}")]
    ValidationFailed { job_name: String, message: String },

    /// Pipeline was cancelled.
    #[error("Job '{job_name}' was cancelled")]
    Cancelled { job_name: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a validation failed error.
    pub fn validation_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    /// Create a cancelled error.
    pub fn cancelled(job_name: impl Into<String>) -> Self {
        Self::Cancelled {
            job_name: job_name.into(),
        }
    }

    /// Name of the failing step, if a step failed.
    pub fn step_name(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step_name, .. } => Some(step_name),
            _ => None,
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// The input could not be acquired.
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// The acquired audio could not be analyzed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// An external tool failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn step_error_displays_command_line() {
        let err: StepError = ProcessError::Failed {
            command: "ffmpeg -y -i in.webm -b:a 320k out.mp3".to_string(),
            exit_code: Some(1),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("-b:a 320k out.mp3"));
    }

    #[test]
    fn pipeline_error_chains_context() {
        let step_err: StepError = AcquisitionError::FileNotFound {
            path: PathBuf::from("/music/song.mp3"),
        }
        .into();
        let pipeline_err = PipelineError::step_failed("song", "Acquire", step_err);

        let msg = pipeline_err.to_string();
        assert!(msg.contains("'song'"));
        assert!(msg.contains("Acquire"));
        assert!(msg.contains("/music/song.mp3"));
        assert_eq!(pipeline_err.step_name(), Some("Acquire"));
    }

    #[test]
    fn io_error_names_operation() {
        let err = StepError::io_error(
            "listing stems",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("listing stems"));
    }
}
