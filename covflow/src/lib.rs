//! # Covflow
//!
//! A sequential coverage pipeline runner for continuous integration.
//!
//! Covflow executes an ordered list of named stages against a single working
//! environment, with support for:
//!
//! - **Declaration-order execution**: stages run strictly in the order they
//!   are defined, never concurrently
//! - **Run conditions**: pure predicates over the trigger context decide
//!   whether a stage executes or is skipped
//! - **Fault tolerance**: a per-stage flag that records a failure without
//!   aborting the pipeline
//! - **Coverage tracefiles**: parsing, path-based filtering, and summarizing
//!   of LCOV line-coverage reports
//! - **Publishing**: uploading a filtered tracefile to an external coverage
//!   service (behind the default-on `publish` feature)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use covflow::prelude::*;
//!
//! // Define a pipeline
//! let pipeline = Pipeline::builder("coverage")
//!     .stage(Stage::new("build", Arc::new(CommandAction::new("cargo").with_args(["build"]))))
//!     .stage(Stage::new("test", Arc::new(CommandAction::new("cargo").with_args(["test"]))))
//!     .build()?;
//!
//! // Execute it
//! let ctx = TriggerContext::capture(EventKind::Manual);
//! let report = pipeline.run(&ctx).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod core;
pub mod coverage;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod stages;
pub mod trigger;

#[cfg(feature = "publish")]
pub mod presets;
#[cfg(feature = "publish")]
pub mod publish;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        ActionOutcome, PipelineReport, PipelineStatus, StageResult, StageStatus,
    };
    pub use crate::coverage::{
        CoverageSummary, PathFilter, Section, SummaryAction,
    };
    pub use crate::errors::{
        CovflowError, PipelineValidationError, TracefileError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{Pipeline, PipelineBuilder};
    pub use crate::stages::{CommandAction, FnAction, NoOpAction, Stage, StageAction};
    pub use crate::trigger::{EventKind, RunCondition, TriggerContext};

    #[cfg(feature = "publish")]
    pub use crate::errors::UploadError;
    #[cfg(feature = "publish")]
    pub use crate::presets::{coverage_pipeline, CommandSpec, CoveragePipelineConfig};
    #[cfg(feature = "publish")]
    pub use crate::publish::{
        CoveragePublisher, CoverageUpload, HttpPublisher, PublishConfig, UploadAction,
    };
}
