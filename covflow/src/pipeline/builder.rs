//! Pipeline builder with validation.

use super::Pipeline;
use crate::errors::PipelineValidationError;
use crate::stages::Stage;
use std::collections::HashSet;

/// Builder for creating validated pipelines.
///
/// Validation happens at [`build`](Self::build): the stage list must be
/// non-empty and stage names unique. Declaration order is execution order.
#[derive(Debug)]
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages added so far.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if no stages were added or a stage name repeats.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        if self.stages.is_empty() {
            return Err(PipelineValidationError::new("Pipeline has no stages"));
        }

        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for stage in &self.stages {
            if !seen.insert(stage.name().to_string()) {
                duplicates.push(stage.name().to_string());
            }
        }
        if !duplicates.is_empty() {
            return Err(PipelineValidationError::new(format!(
                "Duplicate stage names: {}",
                duplicates.join(", ")
            ))
            .with_stages(duplicates));
        }

        Ok(Pipeline::from_parts(self.name, self.stages))
    }
}
