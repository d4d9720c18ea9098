//! Stage entities and their actions.
//!
//! A [`Stage`] is one named unit of work in a pipeline: an opaque action,
//! a run condition, and a fault-tolerance flag. Stages are defined statically
//! before execution and never mutated.

mod command;

pub use command::CommandAction;

use crate::core::ActionOutcome;
use crate::trigger::{EventKind, RunCondition, TriggerContext};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Trait for stage actions.
///
/// An action is the opaque executable part of a stage. It receives the
/// trigger context and returns a binary success/failure signal with captured
/// output. Actions report problems through the outcome; they do not panic.
#[async_trait]
pub trait StageAction: Send + Sync + fmt::Debug {
    /// Executes the action.
    async fn run(&self, ctx: &TriggerContext) -> ActionOutcome;
}

/// A closure-backed action.
///
/// The primary building block for tests and in-process stages.
pub struct FnAction<F>
where
    F: Fn(&TriggerContext) -> ActionOutcome + Send + Sync,
{
    func: F,
}

impl<F> FnAction<F>
where
    F: Fn(&TriggerContext) -> ActionOutcome + Send + Sync,
{
    /// Creates a new closure-backed action.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> fmt::Debug for FnAction<F>
where
    F: Fn(&TriggerContext) -> ActionOutcome + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> StageAction for FnAction<F>
where
    F: Fn(&TriggerContext) -> ActionOutcome + Send + Sync,
{
    async fn run(&self, ctx: &TriggerContext) -> ActionOutcome {
        (self.func)(ctx)
    }
}

/// An action that does nothing and succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAction;

#[async_trait]
impl StageAction for NoOpAction {
    async fn run(&self, _ctx: &TriggerContext) -> ActionOutcome {
        ActionOutcome::success_empty()
    }
}

/// One named unit of work in a pipeline.
#[derive(Clone)]
pub struct Stage {
    name: String,
    action: Arc<dyn StageAction>,
    condition: RunCondition,
    fault_tolerant: bool,
}

impl Stage {
    /// Creates a stage that always runs and whose failure aborts the
    /// pipeline.
    #[must_use]
    pub fn new(name: impl Into<String>, action: Arc<dyn StageAction>) -> Self {
        Self {
            name: name.into(),
            action,
            condition: RunCondition::always(),
            fault_tolerant: false,
        }
    }

    /// Restricts the stage to runs started by the given event kind.
    #[must_use]
    pub fn only_on(self, kind: EventKind) -> Self {
        self.when(RunCondition::event_is(kind))
    }

    /// Replaces the stage's run condition.
    #[must_use]
    pub fn when(mut self, condition: RunCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Marks the stage as fault-tolerant: its failure is recorded but does
    /// not abort the pipeline.
    #[must_use]
    pub fn fault_tolerant(mut self) -> Self {
        self.fault_tolerant = true;
        self
    }

    /// Returns the stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the stage tolerates its own failure.
    #[must_use]
    pub fn is_fault_tolerant(&self) -> bool {
        self.fault_tolerant
    }

    /// Evaluates the stage's run condition.
    #[must_use]
    pub fn should_run(&self, ctx: &TriggerContext) -> bool {
        self.condition.evaluate(ctx)
    }

    /// Runs the stage's action.
    pub async fn execute(&self, ctx: &TriggerContext) -> ActionOutcome {
        self.action.run(ctx).await
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("fault_tolerant", &self.fault_tolerant)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_action() {
        let action = FnAction::new(|_ctx| ActionOutcome::success("done"));
        let ctx = TriggerContext::new(EventKind::Manual);

        let outcome = action.run(&ctx).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.output, "done");
    }

    #[tokio::test]
    async fn test_fn_action_reads_context() {
        let action = FnAction::new(|ctx: &TriggerContext| {
            if ctx.var("TOKEN").is_some() {
                ActionOutcome::success_empty()
            } else {
                ActionOutcome::failure("missing token")
            }
        });

        let without = TriggerContext::new(EventKind::Manual);
        assert!(action.run(&without).await.is_failure());

        let with = TriggerContext::new(EventKind::Manual).with_env("TOKEN", "t");
        assert!(action.run(&with).await.is_success());
    }

    #[tokio::test]
    async fn test_noop_action() {
        let ctx = TriggerContext::new(EventKind::Manual);
        let outcome = NoOpAction.run(&ctx).await;
        assert!(outcome.is_success());
        assert!(outcome.output.is_empty());
    }

    #[tokio::test]
    async fn test_stage_defaults() {
        let stage = Stage::new("build", Arc::new(NoOpAction));
        let ctx = TriggerContext::new(EventKind::Manual);

        assert_eq!(stage.name(), "build");
        assert!(!stage.is_fault_tolerant());
        assert!(stage.should_run(&ctx));
        assert!(stage.execute(&ctx).await.is_success());
    }

    #[test]
    fn test_stage_only_on() {
        let stage = Stage::new("upload", Arc::new(NoOpAction)).only_on(EventKind::UpstreamCall);

        let manual = TriggerContext::new(EventKind::Manual);
        let upstream = TriggerContext::new(EventKind::UpstreamCall);

        assert!(!stage.should_run(&manual));
        assert!(stage.should_run(&upstream));
    }

    #[test]
    fn test_stage_fault_tolerant_flag() {
        let stage = Stage::new("upload", Arc::new(NoOpAction)).fault_tolerant();
        assert!(stage.is_fault_tolerant());
    }

    #[test]
    fn test_stage_debug_names_stage() {
        let stage = Stage::new("report", Arc::new(NoOpAction));
        let rendered = format!("{stage:?}");
        assert!(rendered.contains("report"));
    }
}
