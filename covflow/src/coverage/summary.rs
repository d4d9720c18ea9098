//! Human-readable coverage summaries.

use super::tracefile::{load_sections, Section};
use crate::core::ActionOutcome;
use crate::stages::StageAction;
use crate::trigger::TriggerContext;
use async_trait::async_trait;
use lcov::Record;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Line totals for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    /// The source path.
    pub path: PathBuf,
    /// Instrumented lines.
    pub lines_found: u64,
    /// Lines exercised at least once.
    pub lines_hit: u64,
}

impl FileSummary {
    /// Returns the line coverage percentage.
    #[must_use]
    pub fn line_percent(&self) -> f64 {
        percent(self.lines_hit, self.lines_found)
    }
}

/// Aggregate totals across a tracefile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    /// Per-file totals, in tracefile order.
    pub files: Vec<FileSummary>,
    /// Instrumented lines across all files.
    pub lines_found: u64,
    /// Exercised lines across all files.
    pub lines_hit: u64,
    /// Instrumented functions across all files.
    pub functions_found: u64,
    /// Exercised functions across all files.
    pub functions_hit: u64,
}

impl CoverageSummary {
    /// Computes a summary from parsed sections.
    ///
    /// Uses the `LF:`/`LH:` totals when a section carries them and falls
    /// back to counting `DA:` records otherwise; function totals likewise
    /// prefer `FNF:`/`FNH:` over counting `FNDA:` records.
    #[must_use]
    pub fn from_sections(sections: &[Section]) -> Self {
        let mut files = Vec::with_capacity(sections.len());
        let mut functions_found = 0u64;
        let mut functions_hit = 0u64;

        for section in sections {
            let mut lf = None;
            let mut lh = None;
            let mut da_found = 0u64;
            let mut da_hit = 0u64;
            let mut fnf = None;
            let mut fnh = None;
            let mut fnda_found = 0u64;
            let mut fnda_hit = 0u64;

            for record in &section.records {
                match record {
                    Record::LinesFound { found } => lf = Some(u64::from(*found)),
                    Record::LinesHit { hit } => lh = Some(u64::from(*hit)),
                    Record::LineData { count, .. } => {
                        da_found += 1;
                        if *count > 0 {
                            da_hit += 1;
                        }
                    }
                    Record::FunctionsFound { found } => fnf = Some(u64::from(*found)),
                    Record::FunctionsHit { hit } => fnh = Some(u64::from(*hit)),
                    Record::FunctionData { count, .. } => {
                        fnda_found += 1;
                        if *count > 0 {
                            fnda_hit += 1;
                        }
                    }
                    _ => {}
                }
            }

            files.push(FileSummary {
                path: section.path.clone(),
                lines_found: lf.unwrap_or(da_found),
                lines_hit: lh.unwrap_or(da_hit),
            });
            functions_found += fnf.unwrap_or(fnda_found);
            functions_hit += fnh.unwrap_or(fnda_hit);
        }

        let lines_found = files.iter().map(|f| f.lines_found).sum();
        let lines_hit = files.iter().map(|f| f.lines_hit).sum();

        Self {
            files,
            lines_found,
            lines_hit,
            functions_found,
            functions_hit,
        }
    }

    /// Returns the aggregate line coverage percentage.
    #[must_use]
    pub fn line_percent(&self) -> f64 {
        percent(self.lines_hit, self.lines_found)
    }

    /// Returns the aggregate function coverage percentage.
    #[must_use]
    pub fn function_percent(&self) -> f64 {
        percent(self.functions_hit, self.functions_found)
    }
}

impl fmt::Display for CoverageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Coverage summary ({} files)", self.files.len())?;
        for file in &self.files {
            writeln!(
                f,
                "  {:<50} {:>7}/{:<7} {:>6.1}%",
                file.path.display(),
                file.lines_hit,
                file.lines_found,
                file.line_percent()
            )?;
        }
        writeln!(
            f,
            "  lines: {}/{} ({:.1}%)",
            self.lines_hit,
            self.lines_found,
            self.line_percent()
        )?;
        write!(
            f,
            "  functions: {}/{} ({:.1}%)",
            self.functions_hit,
            self.functions_found,
            self.function_percent()
        )
    }
}

fn percent(hit: u64, found: u64) -> f64 {
    if found == 0 {
        0.0
    } else {
        (hit as f64 / found as f64) * 100.0
    }
}

/// A stage action that reads the tracefile at its well-known path and
/// returns the rendered summary as its captured output.
///
/// The summary covers the unfiltered tracefile; exclusion filtering applies
/// only to uploads.
#[derive(Debug, Clone)]
pub struct SummaryAction {
    tracefile: PathBuf,
}

impl SummaryAction {
    /// Creates a summary action for the given tracefile path.
    #[must_use]
    pub fn new(tracefile: impl AsRef<Path>) -> Self {
        Self {
            tracefile: tracefile.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl StageAction for SummaryAction {
    async fn run(&self, _ctx: &TriggerContext) -> ActionOutcome {
        match load_sections(&self.tracefile) {
            Ok(sections) => {
                let summary = CoverageSummary::from_sections(&sections);
                ActionOutcome::success(summary.to_string())
            }
            Err(err) => ActionOutcome::failure(err.to_string()),
        }
    }
}
