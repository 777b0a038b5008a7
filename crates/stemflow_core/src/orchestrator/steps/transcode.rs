//! Transcode step - converts the acquired audio to an MP3 deliverable.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState};
use crate::runner::ProgressRange;
use crate::tools::mp3_output_path;

/// Progress reported once the MP3 exists.
pub const TRANSCODE_DONE_PROGRESS: u32 = 40;

/// Transcode step.
///
/// The transcoder's own percentages are not mapped into the overall bar;
/// progress jumps to a flat checkpoint when it returns.
pub struct TranscodeStep;

impl TranscodeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TranscodeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for TranscodeStep {
    fn name(&self) -> &str {
        "Transcode"
    }

    fn description(&self) -> &str {
        "Transcode to MP3"
    }

    fn validate_input(&self, ctx: &Context, state: &JobState) -> StepResult<()> {
        let source = state
            .source
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("No acquired input to transcode"))?;

        let output = mp3_output_path(ctx.output_dir(), &source.title, ctx.config.bitrate);
        if output == source.path {
            return Err(StepError::invalid_input(format!(
                "MP3 output would overwrite the input: {}",
                output.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let source = state
            .source
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("No acquired input to transcode"))?;
        let output = mp3_output_path(ctx.output_dir(), &source.title, ctx.config.bitrate);

        ctx.logger.info("Transcoding to MP3 ...");
        ctx.tools.transcoder.transcode(
            &source.path,
            &output,
            ctx.config.bitrate,
            ProgressRange::NONE,
            &ctx.logger,
        )?;

        state.mp3_path = Some(output);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.mp3_path {
            Some(path) if path.is_file() => Ok(()),
            Some(path) => Err(StepError::invalid_output(format!(
                "Transcoder did not produce {}",
                path.display()
            ))),
            None => Err(StepError::invalid_output("No MP3 recorded")),
        }
    }

    fn checkpoint(&self) -> Option<u32> {
        Some(TRANSCODE_DONE_PROGRESS)
    }
}
