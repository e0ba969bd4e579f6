//! CLI Module
//!
//! Command-line interface for letmehear.

pub mod commands;

use clap::Parser;
use std::path::PathBuf;

use crate::config::ProcessingConfig;
use crate::error::Result;

/// Re-split audiobooks into overlapping parts
#[derive(Parser, Debug)]
#[command(name = "letmehear")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory with audio files
    pub source_path: PathBuf,

    /// Process subdirectories as separate groups
    #[arg(short, long)]
    pub recursive: bool,

    /// Put parts under this directory instead of next to the sources
    #[arg(short, long, value_name = "PATH")]
    pub destination: Option<PathBuf>,

    /// Part length in seconds
    #[arg(short, long, value_name = "SECONDS", default_value_t = 180)]
    pub length: u32,

    /// How far each part reaches back into the previous one, in seconds
    #[arg(short, long, value_name = "SECONDS", default_value_t = 1)]
    pub backshift: u32,

    /// Tempo ratio applied while joining, e.g. 1.3
    #[arg(short, long, value_name = "RATIO")]
    pub speed: Option<f64>,

    /// Plan and log without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(long)]
    pub debug: bool,

    /// Number of groups processed at once
    #[arg(short, long, value_name = "N", default_value_t = 1)]
    pub jobs: usize,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Validated processing settings for this invocation.
    pub fn to_config(&self) -> Result<ProcessingConfig> {
        ProcessingConfig::builder()
            .part_length(f64::from(self.length))
            .backshift(f64::from(self.backshift))
            .speed_ratio(self.speed)
            .recursive(self.recursive)
            .dry_run(self.dry_run)
            .destination_path(self.destination.clone())
            .jobs(self.jobs)
            .build()
    }
}
