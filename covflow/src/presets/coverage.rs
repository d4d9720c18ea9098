//! The standard coverage pipeline assembly.
//!
//! Builds the stage list [checkout?, build, test, report, summary, upload]
//! from a declarative config. Checkout, build, test, and report are opaque
//! external commands; summary and upload are in-process actions over the
//! tracefile the report command emits at its well-known path. Upload runs
//! only for upstream calls and is the single fault-tolerant stage.

use crate::coverage::{PathFilter, SummaryAction, DEFAULT_EXCLUDES};
use crate::errors::{CovflowError, PipelineValidationError};
use crate::pipeline::Pipeline;
use crate::publish::{CoveragePublisher, HttpPublisher, PublishConfig, UploadAction};
use crate::stages::{CommandAction, Stage};
use crate::trigger::EventKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One external command of the pipeline definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    /// The program to invoke.
    pub program: String,
    /// Program arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Creates a command spec.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn to_action(&self, workdir: Option<&Path>) -> CommandAction {
        let mut action = CommandAction::new(&self.program).with_args(self.args.iter().cloned());
        if let Some(dir) = workdir {
            action = action.in_dir(dir);
        }
        action
    }
}

/// Declarative definition of the standard coverage pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoveragePipelineConfig {
    /// Pipeline name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Working directory for all external commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
    /// Optional source checkout command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<CommandSpec>,
    /// Builds the instrumented binary.
    pub build: CommandSpec,
    /// Runs the test suite.
    pub test: CommandSpec,
    /// Aggregates coverage data into the tracefile.
    pub report: CommandSpec,
    /// Where the report command writes the tracefile; summary and upload
    /// both read this exact path.
    #[serde(default = "default_tracefile")]
    pub tracefile: PathBuf,
    /// Exclusion patterns (regular expressions) applied before upload.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,
    /// Coverage service settings.
    pub publish: PublishConfig,
}

fn default_name() -> String {
    "coverage".to_string()
}

fn default_tracefile() -> PathBuf {
    PathBuf::from("coverage/coverage.info")
}

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES
        .iter()
        .map(|f| regex::escape(f))
        .collect()
}

impl CoveragePipelineConfig {
    /// Resolves the tracefile path against the working directory.
    #[must_use]
    pub fn tracefile_path(&self) -> PathBuf {
        match &self.workdir {
            Some(dir) if self.tracefile.is_relative() => dir.join(&self.tracefile),
            _ => self.tracefile.clone(),
        }
    }
}

/// Assembles the standard coverage pipeline with an HTTP publisher.
pub fn coverage_pipeline(config: &CoveragePipelineConfig) -> Result<Pipeline, CovflowError> {
    let publisher = HttpPublisher::new(config.publish.clone())?;
    coverage_pipeline_with_publisher(config, Arc::new(publisher))
}

/// Assembles the standard coverage pipeline with a caller-supplied
/// publisher.
pub fn coverage_pipeline_with_publisher(
    config: &CoveragePipelineConfig,
    publisher: Arc<dyn CoveragePublisher>,
) -> Result<Pipeline, CovflowError> {
    let filter = PathFilter::from_patterns(&config.excludes).map_err(|err| {
        CovflowError::Validation(PipelineValidationError::new(format!(
            "Invalid exclusion pattern: {err}"
        )))
    })?;

    let workdir = config.workdir.as_deref();
    let tracefile = config.tracefile_path();

    let mut builder = Pipeline::builder(&config.name);
    if let Some(checkout) = &config.checkout {
        builder = builder.stage(Stage::new("checkout", Arc::new(checkout.to_action(workdir))));
    }
    let pipeline = builder
        .stage(Stage::new("build", Arc::new(config.build.to_action(workdir))))
        .stage(Stage::new("test", Arc::new(config.test.to_action(workdir))))
        .stage(Stage::new("report", Arc::new(config.report.to_action(workdir))))
        .stage(Stage::new("summary", Arc::new(SummaryAction::new(&tracefile))))
        .stage(
            Stage::new("upload", Arc::new(UploadAction::new(&tracefile, filter, publisher)))
                .only_on(EventKind::UpstreamCall)
                .fault_tolerant(),
        )
        .build()?;

    Ok(pipeline)
}
