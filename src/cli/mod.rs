//! Command line interface for msixforge.
//!
//! Collects a complete, validated [`BuildConfiguration`] from arguments
//! and hands it to the pipeline; no interactive collection happens here.
//! Exit status: 0 on `Succeeded` (including degraded/unsigned success),
//! non-zero on `Failed` with the failing stage on the error stream.

mod args;

pub use args::Args;

use crate::error::{CliError, Result};
use crate::pipeline::{ConfigBuilder, PayloadKind, Pipeline, PipelineReport};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();

    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    // validate() has already vetted the spelling
    let payload_kind = PayloadKind::parse_cli(&args.payload_kind)
        .ok_or_else(|| CliError::InvalidArguments {
            reason: format!("Invalid payload kind: {}", args.payload_kind),
        })?;

    let config = ConfigBuilder::new()
        .package_name(&args.package_name)
        .publisher(&args.publisher)
        .output_root(&args.output)
        .payload_kind(payload_kind)
        .telemetry(args.telemetry)
        .detection_artifacts(args.detection_artifacts)
        .skip_downloads(args.skip_downloads)
        .build()
        .map_err(|e| CliError::InvalidArguments {
            reason: e.to_string(),
        })?;

    let pipeline = Pipeline::new(config);
    match pipeline.run().await {
        Ok(report) => {
            print_report(&report);
            Ok(0)
        }
        Err(failure) => {
            eprintln!("Build failed at stage {}: {}", failure.stage, failure.source);
            if let Some(root) = &failure.staging_root {
                eprintln!("Partial staging tree left at {} for inspection", root.display());
            }
            Ok(1)
        }
    }
}

fn print_report(report: &PipelineReport) {
    println!(
        "Succeeded (signed={}, payload={})",
        report.signed, report.effective_kind
    );
    println!("  artifact:    {}", report.artifact_path.display());
    println!("  sha256:      {}", report.artifact_sha256);
    println!("  entry point: {}", report.entry_executable);
    println!(
        "  identity:    {} ({})",
        report.identity.subject, report.identity.thumbprint
    );
    if let (Some(log_path), Some(rule_path)) = (&report.detection_log, &report.detection_rule) {
        println!("  detection:   {}", log_path.display());
        println!("               {}", rule_path.display());
    }
    for event in &report.degrade_events {
        println!("  degraded:    {}", event);
    }
}
