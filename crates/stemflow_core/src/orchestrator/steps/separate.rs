//! Separate step - splits the MP3 into stems.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StemOutput};
use crate::runner::ProgressRange;
use crate::tools::{list_stems, SeparationRequest};

/// Separator percentages are mapped into 50..=100 of the overall bar.
pub const SEPARATE_PROGRESS: ProgressRange = ProgressRange::new(50, 50);

/// Progress reported once the stems exist.
pub const SEPARATE_DONE_PROGRESS: u32 = 100;

/// Separate step.
pub struct SeparateStep;

impl SeparateStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SeparateStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for SeparateStep {
    fn name(&self) -> &str {
        "Separate"
    }

    fn description(&self) -> &str {
        "Split the MP3 into stems"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.source.is_none() {
            return Err(StepError::invalid_input("No acquired input"));
        }
        match &state.mp3_path {
            Some(path) if path.is_file() => Ok(()),
            Some(path) => Err(StepError::invalid_input(format!(
                "MP3 missing: {}",
                path.display()
            ))),
            None => Err(StepError::invalid_input("No MP3 to separate")),
        }
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let (title, mp3) = match (&state.source, &state.mp3_path) {
            (Some(source), Some(mp3)) => (source.title.as_str(), mp3.as_path()),
            _ => return Err(StepError::invalid_input("No MP3 to separate")),
        };

        let request = SeparationRequest {
            input: mp3,
            output_dir: ctx.output_dir(),
            track_name: title,
            model: ctx.config.model,
            two_stems: ctx.config.two_stems,
        };

        ctx.logger.info(&format!(
            "Splitting with {} ({}) ...",
            ctx.tools.separator.name(),
            ctx.config.model
        ));
        let dir = ctx
            .tools
            .separator
            .separate(&request, SEPARATE_PROGRESS, &ctx.logger)?;

        let files = list_stems(&dir).map_err(|e| StepError::io_error("listing stems", e))?;
        let expected = ctx.config.model.stem_count(ctx.config.two_stems);
        if files.len() == expected {
            ctx.logger
                .info(&format!("{} stems written to {}", files.len(), dir.display()));
        } else {
            ctx.logger.warn(&format!(
                "Expected {} stems, found {} in {}",
                expected,
                files.len(),
                dir.display()
            ));
        }

        state.stems = Some(StemOutput { dir, files });
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.stems {
            Some(stems) if !stems.files.is_empty() => Ok(()),
            Some(stems) => Err(StepError::invalid_output(format!(
                "No stems found in {}",
                stems.dir.display()
            ))),
            None => Err(StepError::invalid_output("No stems recorded")),
        }
    }

    fn checkpoint(&self) -> Option<u32> {
        Some(SEPARATE_DONE_PROGRESS)
    }
}
