//! CLI Command Implementations
//!
//! Builds the pipeline for an invocation and prints what it did.

use std::sync::Arc;

use log::info;

use super::Cli;
use crate::error::Result;
use crate::pipeline::{Pipeline, RunReport};
use crate::toolkit::{AudioToolkit, SoxToolkit};

/// Run letmehear with the real SoX toolkit.
pub fn run(cli: &Cli) -> Result<RunReport> {
    run_with_toolkit(cli, Arc::new(SoxToolkit::new()))
}

/// Run letmehear with the given toolkit and print the report.
pub fn run_with_toolkit(cli: &Cli, toolkit: Arc<dyn AudioToolkit>) -> Result<RunReport> {
    let pipeline = Pipeline::new(toolkit, cli.to_config()?);
    if pipeline.config().dry_run() {
        info!("Dry run mode: nothing will be written");
    }

    let report = pipeline.run(&cli.source_path)?;

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print_summary(&report);
    }
    Ok(report)
}

/// Print a human-readable summary of a run.
pub fn print_summary(report: &RunReport) {
    if report.groups.is_empty() {
        println!("No audio found.");
        return;
    }

    for group in &report.groups {
        let status = if group.is_success() { "ok" } else { "FAILED" };
        println!("[{}] {}", status, group.source_path.display());
        println!(
            "      {} file(s), {} resampled -> {}",
            group.files,
            group.resampled,
            group.target_path.display()
        );
        if let Some(plan) = &group.plan {
            println!(
                "      {} part(s) from {:.1}s of audio",
                plan.len(),
                plan.total_duration
            );
        }
        for part in &group.segments.failures {
            println!("      part {} failed: {}", part.index, part.reason);
        }
        if let Some(failure) = &group.failure {
            println!("      {}: {}", failure.code, failure.message);
        }
    }

    println!("{:-<60}", "");
    let verb = if report.dry_run { "planned" } else { "written" };
    println!(
        "{} group(s), {} part(s) {}, {} group(s) with failures",
        report.groups.len(),
        report.total_parts(),
        verb,
        report.failed_groups()
    );
}
