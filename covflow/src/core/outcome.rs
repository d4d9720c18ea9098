//! Action outcome type with factory methods.

use serde::{Deserialize, Serialize};

/// What a stage action returns: a binary success/failure signal plus the
/// captured textual output.
///
/// `ActionOutcome` is immutable once created. The runner never inspects the
/// output beyond recording it; the action alone decides success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Whether the action succeeded.
    pub success: bool,

    /// Captured textual output (stdout and stderr for commands).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,

    /// Error message (for failed actions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionOutcome {
    /// Creates a successful outcome with captured output.
    #[must_use]
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    /// Creates a successful outcome with no output.
    #[must_use]
    pub fn success_empty() -> Self {
        Self::success(String::new())
    }

    /// Creates a failure outcome with an error message.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Creates a failure outcome that preserves the captured output.
    #[must_use]
    pub fn failure_with_output(error: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            error: Some(error.into()),
        }
    }

    /// Returns true if the action succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Returns true if the action failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.success
    }
}

impl Default for ActionOutcome {
    fn default() -> Self {
        Self::success_empty()
    }
}
