//! Pipeline step trait definition.
//!
//! All pipeline steps implement this trait, providing a consistent
//! interface for validation and execution.

use super::errors::StepResult;
use super::types::{Context, JobState};

/// Trait for pipeline steps.
///
/// Each step in the pipeline implements this trait. The pipeline runner
/// calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the step's work
/// 3. `validate_output` - Verify the step produced valid output
///
/// After a step validates, the pipeline emits its `checkpoint` progress
/// value, if it has one.
pub trait PipelineStep: Send + Sync {
    /// Get the step name (for logging and error context).
    fn name(&self) -> &str;

    /// Validate inputs before execution.
    ///
    /// Earlier steps' outputs are available in `state`.
    fn validate_input(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Execute the step's main work and record results in `state`.
    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()>;

    /// Validate outputs after execution.
    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Fixed progress value reported once this step has succeeded.
    fn checkpoint(&self) -> Option<u32> {
        None
    }

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}
