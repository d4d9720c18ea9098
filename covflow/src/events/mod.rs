//! Observability events emitted by the runner.
//!
//! The runner reports stage lifecycle transitions (`stage.started`,
//! `stage.completed`, `stage.failed`, `stage.skipped`, `pipeline.completed`)
//! through an [`EventSink`]. Sinks must never fail the pipeline.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
