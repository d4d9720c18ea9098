//! LCOV coverage tracefile handling.
//!
//! One pipeline stage produces a tracefile at a well-known path; a later
//! stage reads that exact path to render a human-readable summary; the
//! publishing stage uploads the same file after dropping sections whose
//! source path matches an exclusion pattern.

mod filter;
mod summary;
mod tracefile;

pub use filter::{PathFilter, DEFAULT_EXCLUDES};
pub use summary::{CoverageSummary, FileSummary, SummaryAction};
pub use tracefile::{filter_sections, load_sections, render_sections, FilterStats, Section};
