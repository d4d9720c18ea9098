//! Ready-made pipeline assemblies.

mod coverage;

pub use coverage::{coverage_pipeline, coverage_pipeline_with_publisher, CommandSpec, CoveragePipelineConfig};
