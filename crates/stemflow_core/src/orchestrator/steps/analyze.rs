//! Analyze step - estimates tempo and key of the acquired audio.
//!
//! The result is informational and only logged. Audio the analyzer cannot
//! read aborts the job, since the later stages would fail on it too. An
//! inconclusive estimate is logged as `n/a` and the job continues.

use crate::analysis::{AnalysisError, AnalysisReport};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState};

/// Analyze step.
pub struct AnalyzeStep;

impl AnalyzeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnalyzeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for AnalyzeStep {
    fn name(&self) -> &str {
        "Analyze"
    }

    fn description(&self) -> &str {
        "Estimate tempo and key"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.source.is_none() {
            return Err(StepError::invalid_input("No acquired input to analyze"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let source = state
            .source
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("No acquired input to analyze"))?;

        ctx.logger
            .debug(&format!("Analyzing with {}", ctx.tools.analyzer.name()));
        let report = match ctx.tools.analyzer.analyze(&source.path) {
            Ok(report) => report,
            Err(AnalysisError::Inconclusive(reason)) => {
                ctx.logger.warn(&format!("Analysis inconclusive: {}", reason));
                AnalysisReport::default()
            }
            Err(e) => return Err(e.into()),
        };

        ctx.logger
            .info(&format!("Detected tempo: {}", report.tempo_label()));
        ctx.logger
            .info(&format!("Estimated key: {}", report.key_label()));

        state.analysis = Some(report);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.analysis {
            Some(AnalysisReport {
                tempo_bpm: Some(0), ..
            }) => Err(StepError::invalid_output("Tempo must be positive")),
            Some(_) => Ok(()),
            None => Err(StepError::invalid_output("No analysis result")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::AcquiredSource;
    use crate::models::JobEvent;
    use crate::orchestrator::testing::{test_context, FakeAnalyzer};

    fn log_lines(rx: &std::sync::mpsc::Receiver<JobEvent>) -> Vec<String> {
        rx.try_iter()
            .filter_map(|e| match e {
                JobEvent::LogLine { text } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn acquired(state: &mut JobState, ctx: &Context) {
        state.source = Some(AcquiredSource {
            title: "My Song".into(),
            path: std::path::PathBuf::from(&ctx.config.source),
            is_temporary: false,
        });
    }

    #[test]
    fn logs_tempo_and_key() {
        let (ctx, rx, _dir) = test_context();
        let mut state = JobState::new("job");
        acquired(&mut state, &ctx);

        AnalyzeStep::new().execute(&ctx, &mut state).unwrap();
        AnalyzeStep::new().validate_output(&ctx, &state).unwrap();

        let lines = log_lines(&rx);
        assert!(lines.contains(&"Detected tempo: 128 BPM".to_string()));
        assert!(lines.contains(&"Estimated key: A minor".to_string()));
    }

    #[test]
    fn analysis_failure_is_propagated() {
        let (mut ctx, _rx, _dir) = test_context();
        ctx.tools.analyzer = Box::new(FakeAnalyzer {
            fail: true,
            ..Default::default()
        });
        let mut state = JobState::new("job");
        acquired(&mut state, &ctx);

        let err = AnalyzeStep::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::Analysis(AnalysisError::Decode(_))));
        assert!(state.analysis.is_none());
    }

    #[test]
    fn inconclusive_analysis_continues_with_placeholders() {
        let (mut ctx, rx, _dir) = test_context();
        ctx.tools.analyzer = Box::new(FakeAnalyzer {
            inconclusive: true,
            ..Default::default()
        });
        let mut state = JobState::new("job");
        acquired(&mut state, &ctx);

        AnalyzeStep::new().execute(&ctx, &mut state).unwrap();
        AnalyzeStep::new().validate_output(&ctx, &state).unwrap();

        assert_eq!(state.analysis, Some(AnalysisReport::default()));
        let lines = log_lines(&rx);
        assert!(lines.contains(&"Detected tempo: n/a".to_string()));
        assert!(lines.contains(&"Estimated key: n/a".to_string()));
    }

    #[test]
    fn requires_acquired_input() {
        let (ctx, _rx, _dir) = test_context();
        let state = JobState::new("job");
        assert!(AnalyzeStep::new().validate_input(&ctx, &state).is_err());
    }
}
