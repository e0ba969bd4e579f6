//! SoX audio toolkit
//!
//! Drives the `sox` and `soxi` command line tools. SoX with format plugins
//! must be installed (on Ubuntu: `sox` and `libsox-fmt-all`).
//!
//! Environment:
//! - `LETMEHEAR_SOX_PATH` - `sox` executable (default: `sox`)
//! - `LETMEHEAR_SOXI_PATH` - `soxi` executable (default: `soxi`)
//! - `LETMEHEAR_TOOL_TIMEOUT_SECS` - per-command timeout (default: 3600)

use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use log::debug;

use super::capability::AudioToolkit;
use super::runner::CommandRunner;
use crate::error::{LetMeHearError, Result};

/// Default timeout for a single SoX invocation, in seconds.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 3600;

const FORMATS_MARKER: &str = "AUDIO FILE FORMATS:";

/// SoX-backed [`AudioToolkit`]
#[derive(Debug, Clone)]
pub struct SoxToolkit {
    sox_path: String,
    soxi_path: String,
    runner: CommandRunner,
}

impl SoxToolkit {
    /// Create a toolkit configured from the environment
    pub fn new() -> Self {
        let sox_path = env::var("LETMEHEAR_SOX_PATH").unwrap_or_else(|_| "sox".to_string());
        let soxi_path = env::var("LETMEHEAR_SOXI_PATH").unwrap_or_else(|_| "soxi".to_string());
        let timeout_secs = env::var("LETMEHEAR_TOOL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS);

        Self::with_config(sox_path, soxi_path, Duration::from_secs(timeout_secs))
    }

    /// Create a toolkit with explicit executables and timeout
    pub fn with_config(
        sox_path: impl Into<String>,
        soxi_path: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            sox_path: sox_path.into(),
            soxi_path: soxi_path.into(),
            runner: CommandRunner::new(timeout),
        }
    }

    fn sox(&self) -> Command {
        Command::new(&self.sox_path)
    }

    fn soxi_value(&self, flag: &str, what: &'static str, path: &Path) -> Result<String> {
        let probe_error = |reason: String| LetMeHearError::Probe {
            what,
            path: path.to_path_buf(),
            reason,
        };

        let mut cmd = Command::new(&self.soxi_path);
        cmd.arg(flag).arg(path);
        let output = self
            .runner
            .run_checked(&mut cmd)
            .map_err(|e| probe_error(e.to_string()))?;

        let value = output.stdout.trim().to_string();
        if value.is_empty() {
            return Err(probe_error("soxi printed nothing".to_string()));
        }
        Ok(value)
    }

    fn concatenate_command(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        speed_ratio: Option<f64>,
    ) -> Command {
        let mut cmd = self.sox();
        if inputs.len() > 1 {
            cmd.args(["--combine", "concatenate"]);
        }
        for input in inputs {
            cmd.arg("--ignore-length").arg(input);
        }
        cmd.arg(output);
        if let Some(ratio) = speed_ratio {
            cmd.arg("tempo").arg(ratio.to_string());
        }
        cmd
    }

    fn trim_command(&self, input: &Path, start_secs: f64, length_secs: f64, output: &Path) -> Command {
        let mut cmd = self.sox();
        cmd.arg(input)
            .arg(output)
            .arg("trim")
            .arg(start_secs.to_string())
            .arg(length_secs.to_string());
        cmd
    }

    fn resample_command(&self, input: &Path, target_rate_hz: u32, output: &Path) -> Command {
        let mut cmd = self.sox();
        cmd.arg(input)
            .arg(output)
            .arg("rate")
            .arg(target_rate_hz.to_string());
        cmd
    }
}

impl Default for SoxToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioToolkit for SoxToolkit {
    fn name(&self) -> &str {
        &self.sox_path
    }

    fn is_available(&self) -> bool {
        match self.runner.run(self.sox().arg("--version")) {
            Ok(output) => {
                debug!("Found {}", output.stdout.trim());
                output.success
            }
            Err(e) => {
                debug!("SoX is not usable: {}", e);
                false
            }
        }
    }

    fn supported_decode_formats(&self) -> Result<BTreeSet<String>> {
        // `sox -h` exits non-zero on some builds while still printing the help.
        let output = self.runner.run(self.sox().arg("-h"))?;
        Ok(parse_supported_formats(&output.stdout))
    }

    fn probe_duration_seconds(&self, path: &Path) -> Result<f64> {
        let value = self.soxi_value("-D", "duration", path)?;
        match value.parse::<f64>() {
            Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
            _ => Err(LetMeHearError::Probe {
                what: "duration",
                path: path.to_path_buf(),
                reason: format!("unexpected soxi output '{}'", value),
            }),
        }
    }

    fn probe_sample_rate_hz(&self, path: &Path) -> Result<u32> {
        let value = self.soxi_value("-r", "sample rate", path)?;
        match value.parse::<f64>() {
            Ok(rate) if rate.is_finite() && rate >= 1.0 && rate <= u32::MAX as f64 => {
                Ok(rate.round() as u32)
            }
            _ => Err(LetMeHearError::Probe {
                what: "sample rate",
                path: path.to_path_buf(),
                reason: format!("unexpected soxi output '{}'", value),
            }),
        }
    }

    fn resample(&self, input: &Path, target_rate_hz: u32, output: &Path) -> Result<()> {
        self.runner
            .run_checked(&mut self.resample_command(input, target_rate_hz, output))?;
        Ok(())
    }

    fn concatenate(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        speed_ratio: Option<f64>,
    ) -> Result<()> {
        self.runner
            .run_checked(&mut self.concatenate_command(inputs, output, speed_ratio))?;
        Ok(())
    }

    fn trim_extract(
        &self,
        input: &Path,
        start_secs: f64,
        length_secs: f64,
        output: &Path,
    ) -> Result<()> {
        self.runner
            .run_checked(&mut self.trim_command(input, start_secs, length_secs, output))?;
        Ok(())
    }
}

/// Pull the format list out of `sox -h` output.
fn parse_supported_formats(help: &str) -> BTreeSet<String> {
    help.lines()
        .find_map(|line| {
            let line = line.trim();
            let marker_len = FORMATS_MARKER.len();
            line.get(..marker_len)
                .filter(|prefix| prefix.eq_ignore_ascii_case(FORMATS_MARKER))
                .map(|_| line[marker_len..].to_string())
        })
        .map(|list| {
            list.split_whitespace()
                .map(|format| format.to_lowercase())
                .collect()
        })
        .unwrap_or_default()
}
