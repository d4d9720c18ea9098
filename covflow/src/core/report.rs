//! Per-stage results and the aggregated pipeline report.

use super::{PipelineStatus, StageStatus};
use crate::errors::CovflowError;
use crate::trigger::EventKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The recorded outcome of running one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    /// Stage name.
    pub name: String,
    /// Stage status.
    pub status: StageStatus,
    /// Captured output.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    /// Error message if failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the stage's failure would have been tolerated.
    pub fault_tolerant: bool,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
}

impl StageResult {
    /// Creates a successful stage result.
    #[must_use]
    pub fn success(
        name: impl Into<String>,
        output: impl Into<String>,
        started_at: DateTime<Utc>,
        fault_tolerant: bool,
    ) -> Self {
        Self {
            name: name.into(),
            status: StageStatus::Success,
            output: output.into(),
            error: None,
            fault_tolerant,
            started_at,
            ended_at: Utc::now(),
        }
    }

    /// Creates a failed stage result.
    #[must_use]
    pub fn failure(
        name: impl Into<String>,
        output: impl Into<String>,
        error: impl Into<String>,
        started_at: DateTime<Utc>,
        fault_tolerant: bool,
    ) -> Self {
        Self {
            name: name.into(),
            status: StageStatus::Failure,
            output: output.into(),
            error: Some(error.into()),
            fault_tolerant,
            started_at,
            ended_at: Utc::now(),
        }
    }

    /// Creates a skipped stage result.
    ///
    /// A skip records no output; start and end coincide.
    #[must_use]
    pub fn skipped(name: impl Into<String>, fault_tolerant: bool) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            status: StageStatus::Skipped,
            output: String::new(),
            error: None,
            fault_tolerant,
            started_at: now,
            ended_at: now,
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the stage failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// Returns true if the stage was skipped.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.status.is_skipped()
    }

    /// Returns true if this is a failure the pipeline tolerated.
    #[must_use]
    pub fn is_tolerated_failure(&self) -> bool {
        self.is_failure() && self.fault_tolerant
    }

    /// Converts a failure into its execution error, if this stage failed.
    #[must_use]
    pub fn execution_error(&self) -> Option<CovflowError> {
        if !self.is_failure() {
            return None;
        }
        Some(CovflowError::StageExecution {
            stage: self.name.clone(),
            message: self
                .error
                .clone()
                .unwrap_or_else(|| "action reported failure".to_string()),
        })
    }
}

/// The ordered record of one pipeline run.
///
/// Stages never attempted (those declared after a non-tolerant failure) have
/// no entry at all; they are neither succeeded, failed, nor skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Pipeline name.
    pub pipeline: String,
    /// Unique id of this run.
    pub run_id: Uuid,
    /// The event that started the run.
    pub event: EventKind,
    /// Per-stage results in execution order.
    pub results: Vec<StageResult>,
    /// Overall status.
    pub status: PipelineStatus,
}

impl PipelineReport {
    /// Creates a report, deriving the overall status from the results.
    #[must_use]
    pub fn new(
        pipeline: impl Into<String>,
        run_id: Uuid,
        event: EventKind,
        results: Vec<StageResult>,
    ) -> Self {
        let status = Self::compute_status(&results);
        Self {
            pipeline: pipeline.into(),
            run_id,
            event,
            results,
            status,
        }
    }

    /// Derives the overall status from a result list.
    ///
    /// `Failed` iff any recorded result is a non-tolerated failure. Tolerated
    /// failures and skips never affect the verdict.
    #[must_use]
    pub fn compute_status(results: &[StageResult]) -> PipelineStatus {
        let failed = results
            .iter()
            .any(|r| r.is_failure() && !r.fault_tolerant);
        if failed {
            PipelineStatus::Failed
        } else {
            PipelineStatus::Passed
        }
    }

    /// Looks up the result for a stage by name.
    #[must_use]
    pub fn result(&self, name: &str) -> Option<&StageResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Returns the number of recorded results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if no stage was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns true if the run passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status.is_passed()
    }

    /// Converts a failed report into an error for `?`-style callers.
    ///
    /// The error names the first non-tolerated failure.
    pub fn into_result(self) -> Result<Self, CovflowError> {
        if self.passed() {
            return Ok(self);
        }
        let stage = self
            .results
            .iter()
            .find(|r| r.is_failure() && !r.fault_tolerant)
            .map_or_else(|| "unknown".to_string(), |r| r.name.clone());
        Err(CovflowError::Aborted { stage })
    }
}
