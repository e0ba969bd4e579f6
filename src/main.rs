//! letmehear CLI
//!
//! Re-splits audiobooks into overlapping parts.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::debug;

use letmehear::cli::{commands, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    debug!("letmehear v{}", env!("CARGO_PKG_VERSION"));

    match commands::run(&cli) {
        Ok(report) => ExitCode::from(report.exit_code()),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            if let Some(suggestion) = e.recovery_suggestion() {
                eprintln!("       {}", suggestion);
            }
            ExitCode::from(e.exit_code())
        }
    }
}
