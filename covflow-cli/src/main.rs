//! Command-line front-end for the covflow coverage pipeline runner.
//!
//! Loads a TOML pipeline definition, runs the standard coverage pipeline
//! for the requested trigger, prints the report, and maps the overall
//! status to the process exit code.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use covflow::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "covflow", version, about = "Run a coverage pipeline and publish the results")]
struct Cli {
    /// How this run was triggered.
    #[arg(long, value_enum, default_value = "manual")]
    event: EventArg,

    /// Path to the pipeline definition.
    #[arg(long, short, default_value = "covflow.toml")]
    config: PathBuf,

    /// Print the full report as JSON instead of a text summary.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EventArg {
    /// Started by an operator.
    Manual,
    /// Invoked by another pipeline.
    UpstreamCall,
}

impl From<EventArg> for EventKind {
    fn from(arg: EventArg) -> Self {
        match arg {
            EventArg::Manual => Self::Manual,
            EventArg::UpstreamCall => Self::UpstreamCall,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let raw = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read pipeline definition {}", cli.config.display()))?;
    let config: CoveragePipelineConfig = toml::from_str(&raw)
        .with_context(|| format!("Invalid pipeline definition {}", cli.config.display()))?;

    let pipeline = coverage_pipeline(&config)?;
    let ctx = TriggerContext::capture(cli.event.into());

    let report = pipeline.run_with_sink(&ctx, &LoggingEventSink::default()).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, ctx.color_output());
    }

    if report.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_report(report: &PipelineReport, color: bool) {
    println!("pipeline {} ({})", report.pipeline, report.run_id);
    for result in &report.results {
        let status = paint(result.status, color);
        let mut line = format!("  {status:<18} {}", result.name);
        if !result.is_skipped() {
            line.push_str(&format!("  {:.0} ms", result.duration_ms()));
        }
        if let Some(error) = &result.error {
            line.push_str(&format!("  ({error})"));
        }
        println!("{line}");
    }
    println!("overall: {}", report.status);
}

/// Colors a stage status for terminal output. Cosmetic only.
fn paint(status: StageStatus, color: bool) -> String {
    if !color {
        return status.to_string();
    }
    let code = match status {
        StageStatus::Success => "32",
        StageStatus::Failure => "31",
        StageStatus::Skipped => "33",
    };
    format!("\x1b[{code}m{status}\x1b[0m")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_arg_maps_to_event_kind() {
        assert_eq!(EventKind::from(EventArg::Manual), EventKind::Manual);
        assert_eq!(
            EventKind::from(EventArg::UpstreamCall),
            EventKind::UpstreamCall
        );
    }

    #[test]
    fn test_cli_parses_defaults() {
        let cli = Cli::parse_from(["covflow"]);
        assert!(matches!(cli.event, EventArg::Manual));
        assert_eq!(cli.config, PathBuf::from("covflow.toml"));
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_parses_upstream_call() {
        let cli = Cli::parse_from(["covflow", "--event", "upstream-call", "--json"]);
        assert!(matches!(cli.event, EventArg::UpstreamCall));
        assert!(cli.json);
    }

    #[test]
    fn test_paint_without_color_is_plain() {
        assert_eq!(paint(StageStatus::Success, false), "success");
        assert!(paint(StageStatus::Failure, true).contains("31"));
    }
}
