//! Trigger context and run conditions.
//!
//! A pipeline run starts with an immutable [`TriggerContext`]: the event that
//! started the run plus the environment captured once at pipeline start.
//! Stages never read ambient process state; everything they may branch on or
//! propagate comes through the context.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Environment variable holding the cosmetic color preference.
///
/// Forwarded to stage commands and consulted for report rendering; it has no
/// effect on pass/fail semantics.
pub const COLOR_ENV: &str = "CARGO_TERM_COLOR";

/// Environment variable holding a free-text label for the run.
///
/// Forwarded to the coverage service for downstream display only; the runner
/// never branches on it.
pub const RUN_LABEL_ENV: &str = "COVFLOW_RUN_LABEL";

/// How a pipeline run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Started by an operator.
    Manual,
    /// Invoked as a callable sub-pipeline by another pipeline.
    UpstreamCall,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::UpstreamCall => write!(f, "upstream_call"),
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "upstream_call" | "upstream-call" => Ok(Self::UpstreamCall),
            other => Err(format!("Unknown event kind '{other}'")),
        }
    }
}

/// Immutable description of how and why a pipeline run was invoked.
///
/// Created once at pipeline start and read-only thereafter. The contained
/// environment is overlaid on the parent environment when stage commands are
/// spawned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerContext {
    event: EventKind,
    env: HashMap<String, String>,
}

impl TriggerContext {
    /// Creates a context with an empty environment.
    #[must_use]
    pub fn new(event: EventKind) -> Self {
        Self {
            event,
            env: HashMap::new(),
        }
    }

    /// Creates a context by capturing the process environment once.
    #[must_use]
    pub fn capture(event: EventKind) -> Self {
        Self {
            event,
            env: std::env::vars().collect(),
        }
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Returns the event that started this run.
    #[must_use]
    pub fn event(&self) -> EventKind {
        self.event
    }

    /// Returns the captured environment.
    #[must_use]
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Looks up a single environment variable.
    #[must_use]
    pub fn var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Returns true unless color output is explicitly disabled.
    #[must_use]
    pub fn color_output(&self) -> bool {
        self.var(COLOR_ENV) != Some("never")
    }

    /// Returns the free-text run label, if one was provided.
    #[must_use]
    pub fn run_label(&self) -> Option<&str> {
        self.var(RUN_LABEL_ENV)
    }
}

/// A pure predicate over the trigger context.
///
/// Evaluated by the runner before each stage; a false result records the
/// stage as skipped. Conditions are values, so each one can be unit tested
/// in isolation from any pipeline.
#[derive(Clone)]
pub struct RunCondition {
    inner: Arc<dyn Fn(&TriggerContext) -> bool + Send + Sync>,
}

impl RunCondition {
    /// A condition that always passes.
    #[must_use]
    pub fn always() -> Self {
        Self {
            inner: Arc::new(|_| true),
        }
    }

    /// A condition satisfied only by the given event kind.
    #[must_use]
    pub fn event_is(kind: EventKind) -> Self {
        Self {
            inner: Arc::new(move |ctx| ctx.event() == kind),
        }
    }

    /// A condition backed by an arbitrary predicate.
    pub fn from_fn<F>(predicate: F) -> Self
    where
        F: Fn(&TriggerContext) -> bool + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(predicate),
        }
    }

    /// Evaluates the condition against a context.
    #[must_use]
    pub fn evaluate(&self, ctx: &TriggerContext) -> bool {
        (self.inner)(ctx)
    }
}

impl Default for RunCondition {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Debug for RunCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunCondition").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_display() {
        assert_eq!(EventKind::Manual.to_string(), "manual");
        assert_eq!(EventKind::UpstreamCall.to_string(), "upstream_call");
    }

    #[test]
    fn test_event_kind_parse() {
        assert_eq!("manual".parse::<EventKind>(), Ok(EventKind::Manual));
        assert_eq!(
            "upstream_call".parse::<EventKind>(),
            Ok(EventKind::UpstreamCall)
        );
        assert_eq!(
            "upstream-call".parse::<EventKind>(),
            Ok(EventKind::UpstreamCall)
        );
        assert!("push".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_event_kind_serialize() {
        let json = serde_json::to_string(&EventKind::UpstreamCall).unwrap();
        assert_eq!(json, r#""upstream_call""#);
    }

    #[test]
    fn test_context_env_access() {
        let ctx = TriggerContext::new(EventKind::Manual)
            .with_env("KEY", "value")
            .with_env(RUN_LABEL_ENV, "nightly coverage");

        assert_eq!(ctx.event(), EventKind::Manual);
        assert_eq!(ctx.var("KEY"), Some("value"));
        assert_eq!(ctx.var("MISSING"), None);
        assert_eq!(ctx.run_label(), Some("nightly coverage"));
    }

    #[test]
    fn test_context_color_preference() {
        let ctx = TriggerContext::new(EventKind::Manual);
        assert!(ctx.color_output());

        let ctx = ctx.with_env(COLOR_ENV, "never");
        assert!(!ctx.color_output());

        let ctx = TriggerContext::new(EventKind::Manual).with_env(COLOR_ENV, "always");
        assert!(ctx.color_output());
    }

    #[test]
    fn test_condition_always() {
        let ctx = TriggerContext::new(EventKind::Manual);
        assert!(RunCondition::always().evaluate(&ctx));
        assert!(RunCondition::default().evaluate(&ctx));
    }

    #[test]
    fn test_condition_event_is() {
        let condition = RunCondition::event_is(EventKind::UpstreamCall);

        let manual = TriggerContext::new(EventKind::Manual);
        let upstream = TriggerContext::new(EventKind::UpstreamCall);

        assert!(!condition.evaluate(&manual));
        assert!(condition.evaluate(&upstream));
    }

    #[test]
    fn test_condition_from_fn() {
        let condition = RunCondition::from_fn(|ctx| ctx.var("ENABLED") == Some("1"));

        let off = TriggerContext::new(EventKind::Manual);
        let on = TriggerContext::new(EventKind::Manual).with_env("ENABLED", "1");

        assert!(!condition.evaluate(&off));
        assert!(condition.evaluate(&on));
    }

    #[test]
    fn test_context_serialization() {
        let ctx = TriggerContext::new(EventKind::UpstreamCall).with_env("A", "1");
        let json = serde_json::to_string(&ctx).unwrap();
        let deserialized: TriggerContext = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.event(), EventKind::UpstreamCall);
        assert_eq!(deserialized.var("A"), Some("1"));
    }
}
