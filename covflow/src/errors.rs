//! Error types for the covflow runner.
//!
//! A deliberate skip (a run condition evaluating to false) is not an error
//! anywhere in this taxonomy; it is a recorded stage status.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for covflow operations.
#[derive(Debug, Error)]
pub enum CovflowError {
    /// A pipeline validation error occurred.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A stage's external action reported non-success.
    #[error("Stage '{stage}' failed: {message}")]
    StageExecution {
        /// The stage that failed.
        stage: String,
        /// The action's error message.
        message: String,
    },

    /// The pipeline stopped because a non-tolerant stage failed.
    #[error("Pipeline aborted at stage '{stage}'")]
    Aborted {
        /// The stage whose failure aborted the run.
        stage: String,
    },

    /// A coverage tracefile could not be read or parsed.
    #[error("{0}")]
    Tracefile(#[from] TracefileError),

    /// An upload to the coverage service failed.
    #[cfg(feature = "publish")]
    #[error("{0}")]
    Upload(#[from] UploadError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Error raised when pipeline validation fails.
///
/// Produced by [`crate::pipeline::PipelineBuilder::build`] for an empty
/// pipeline or duplicate stage names.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
}

impl PipelineValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
        }
    }

    /// Attaches the offending stage names.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }
}

/// Error raised when an LCOV tracefile cannot be processed.
#[derive(Debug, Error)]
pub enum TracefileError {
    /// The tracefile could not be opened or read.
    #[error("Failed to read tracefile {path}: {source}")]
    Read {
        /// The tracefile path.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// A record in the tracefile could not be parsed.
    #[error("Invalid record in tracefile {path}: {message}")]
    Parse {
        /// The tracefile path.
        path: PathBuf,
        /// The parser's error message.
        message: String,
    },
}

/// Error raised when publishing a coverage report fails.
#[cfg(feature = "publish")]
#[derive(Debug, Error)]
pub enum UploadError {
    /// The HTTP client could not be built or the request could not be sent.
    #[error("Upload request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The coverage service answered with a non-success status.
    #[error("Coverage service rejected upload: HTTP {status}")]
    Rejected {
        /// The HTTP status code.
        status: u16,
    },
}
