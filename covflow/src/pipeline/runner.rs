//! The sequential pipeline runner.

use super::PipelineBuilder;
use crate::core::{PipelineReport, StageResult};
use crate::events::{EventSink, NoOpEventSink};
use crate::stages::Stage;
use crate::trigger::TriggerContext;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

/// A validated, ordered list of stages.
///
/// Construct through [`Pipeline::builder`]. Execution is a single linear
/// scan: each stage's run condition is evaluated against the trigger
/// context, its action is awaited to completion, and a non-tolerant failure
/// stops the run so that later stages are never attempted and leave no
/// record at all. The runner performs no retries and defines no timeouts; a
/// hung action blocks the pipeline.
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Starts a builder for a pipeline with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    pub(super) fn from_parts(name: String, stages: Vec<Stage>) -> Self {
        Self { name, stages }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in declaration order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Runs the pipeline without event emission.
    pub async fn run(&self, ctx: &TriggerContext) -> PipelineReport {
        self.run_with_sink(ctx, &NoOpEventSink).await
    }

    /// Runs the pipeline, reporting stage transitions to the given sink.
    pub async fn run_with_sink(
        &self,
        ctx: &TriggerContext,
        sink: &dyn EventSink,
    ) -> PipelineReport {
        let run_id = Uuid::new_v4();
        info!(
            pipeline = %self.name,
            run_id = %run_id,
            event = %ctx.event(),
            "Pipeline run started"
        );

        let mut results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            if !stage.should_run(ctx) {
                sink.try_emit(
                    "stage.skipped",
                    Some(serde_json::json!({
                        "stage": stage.name(),
                        "event": ctx.event().to_string(),
                    })),
                );
                results.push(StageResult::skipped(stage.name(), stage.is_fault_tolerant()));
                continue;
            }

            sink.try_emit(
                "stage.started",
                Some(serde_json::json!({ "stage": stage.name() })),
            );

            let started_at = Utc::now();
            let outcome = stage.execute(ctx).await;

            if outcome.is_success() {
                let result = StageResult::success(
                    stage.name(),
                    outcome.output,
                    started_at,
                    stage.is_fault_tolerant(),
                );
                sink.try_emit(
                    "stage.completed",
                    Some(serde_json::json!({
                        "stage": stage.name(),
                        "duration_ms": result.duration_ms(),
                    })),
                );
                results.push(result);
                continue;
            }

            let error = outcome
                .error
                .unwrap_or_else(|| "Stage action reported failure".to_string());
            let result = StageResult::failure(
                stage.name(),
                outcome.output,
                error.clone(),
                started_at,
                stage.is_fault_tolerant(),
            );
            sink.try_emit(
                "stage.failed",
                Some(serde_json::json!({
                    "stage": stage.name(),
                    "error": error,
                    "tolerated": stage.is_fault_tolerant(),
                })),
            );
            let fatal = !stage.is_fault_tolerant();
            results.push(result);

            if fatal {
                warn!(
                    pipeline = %self.name,
                    stage = %stage.name(),
                    "Stage failed; aborting pipeline"
                );
                break;
            }
        }

        let report = PipelineReport::new(&self.name, run_id, ctx.event(), results);
        sink.try_emit(
            "pipeline.completed",
            Some(serde_json::json!({
                "pipeline": self.name,
                "status": report.status.to_string(),
                "stages": report.len(),
            })),
        );
        info!(
            pipeline = %self.name,
            run_id = %run_id,
            status = %report.status,
            "Pipeline run finished"
        );

        report
    }
}
