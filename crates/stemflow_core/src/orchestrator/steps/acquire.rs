//! Acquire step - resolves the job input to a local audio file.

use crate::acquisition::SourceAcquirer;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState};

/// Acquire step.
///
/// Local inputs are validated in place; URLs are downloaded into the
/// job's temp directory by the configured fetcher. The acquirer reports
/// its own progress (0 and 10), so this step has no checkpoint.
pub struct AcquireStep;

impl AcquireStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AcquireStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for AcquireStep {
    fn name(&self) -> &str {
        "Acquire"
    }

    fn description(&self) -> &str {
        "Resolve the input to a local audio file"
    }

    fn validate_input(&self, ctx: &Context, _state: &JobState) -> StepResult<()> {
        if ctx.config.source.trim().is_empty() {
            return Err(StepError::invalid_input("No source given"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let acquirer = SourceAcquirer::new(ctx.tools.fetcher.as_ref(), &ctx.temp_dir);
        let source = acquirer.acquire(&ctx.config, &ctx.logger)?;

        ctx.logger.debug(&format!(
            "Input '{}' at {}",
            source.title,
            source.path.display()
        ));
        state.source = Some(source);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let source = state
            .source
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("No input was acquired"))?;

        if !source.path.is_file() {
            return Err(StepError::invalid_output(format!(
                "Acquired input does not exist: {}",
                source.path.display()
            )));
        }
        Ok(())
    }
}
