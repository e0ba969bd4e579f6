//! Fake audio toolkit for testing
//!
//! Doesn't touch real audio but simulates SoX closely enough for pipeline
//! testing: mutating calls write small placeholder files, remember the
//! sample rate and duration of what they "produced", and every call is
//! recorded for later inspection.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::capability::AudioToolkit;
use crate::error::{LetMeHearError, Result};

const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_DURATION_SECS: f64 = 60.0;

/// One recorded toolkit invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolkitCall {
    FormatQuery,
    ProbeDuration(PathBuf),
    ProbeSampleRate(PathBuf),
    Resample {
        input: PathBuf,
        target_rate_hz: u32,
        output: PathBuf,
    },
    Concatenate {
        inputs: Vec<PathBuf>,
        output: PathBuf,
        speed_ratio: Option<f64>,
    },
    TrimExtract {
        input: PathBuf,
        start_secs: f64,
        length_secs: f64,
        output: PathBuf,
    },
}

impl ToolkitCall {
    /// Whether the call writes a file
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            ToolkitCall::Resample { .. }
                | ToolkitCall::Concatenate { .. }
                | ToolkitCall::TrimExtract { .. }
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct FakeAudio {
    sample_rate: u32,
    duration_secs: f64,
}

#[derive(Debug, Default)]
struct FakeState {
    files: HashMap<PathBuf, FakeAudio>,
    calls: Vec<ToolkitCall>,
}

/// In-process [`AudioToolkit`] used by the test suite
///
/// Clones share their recorded state.
#[derive(Debug, Clone)]
pub struct FakeToolkit {
    available: bool,
    formats: Option<Vec<String>>,
    unreadable: HashSet<PathBuf>,
    failing_trims: HashSet<String>,
    fail_concatenate: bool,
    state: Arc<Mutex<FakeState>>,
}

impl FakeToolkit {
    pub fn new() -> Self {
        Self {
            available: true,
            formats: Some(
                ["flac", "mp3", "ogg", "wav"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            unreadable: HashSet::new(),
            failing_trims: HashSet::new(),
            fail_concatenate: false,
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    /// Report the toolkit as missing
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_formats(mut self, formats: &[&str]) -> Self {
        self.formats = Some(formats.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Make the format query fail
    pub fn failing_format_query(mut self) -> Self {
        self.formats = None;
        self
    }

    /// Declare the sample rate and duration of an input file
    pub fn with_audio(self, path: impl Into<PathBuf>, sample_rate: u32, duration_secs: f64) -> Self {
        self.lock().files.insert(
            path.into(),
            FakeAudio {
                sample_rate,
                duration_secs,
            },
        );
        self
    }

    /// Make every probe of `path` fail
    pub fn with_unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        self.unreadable.insert(path.into());
        self
    }

    /// Make extraction into an output named `file_name` fail
    pub fn with_failing_trim(mut self, file_name: &str) -> Self {
        self.failing_trims.insert(file_name.to_string());
        self
    }

    pub fn failing_concatenate(mut self) -> Self {
        self.fail_concatenate = true;
        self
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<ToolkitCall> {
        self.lock().calls.clone()
    }

    pub fn resample_calls(&self) -> Vec<ToolkitCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, ToolkitCall::Resample { .. }))
            .collect()
    }

    pub fn mutating_calls(&self) -> Vec<ToolkitCall> {
        self.calls()
            .into_iter()
            .filter(ToolkitCall::is_mutating)
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        // A panicking test thread must not hide the recorded calls from others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: ToolkitCall) {
        self.lock().calls.push(call);
    }

    fn lookup(&self, what: &'static str, path: &Path) -> Result<FakeAudio> {
        let probe_error = |reason: &str| LetMeHearError::Probe {
            what,
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if self.unreadable.contains(path) {
            return Err(probe_error("unreadable audio"));
        }
        if let Some(audio) = self.lock().files.get(path) {
            return Ok(*audio);
        }
        if path.is_file() {
            return Ok(FakeAudio {
                sample_rate: DEFAULT_SAMPLE_RATE,
                duration_secs: DEFAULT_DURATION_SECS,
            });
        }
        Err(probe_error("no such file"))
    }

    fn produce(&self, output: &Path, audio: FakeAudio) -> Result<()> {
        fs::write(output, b"fake audio").map_err(|e| LetMeHearError::CommandFailed {
            command: format!("fake-sox {}", output.display()),
            exit_code: 2,
            stderr: e.to_string(),
        })?;
        self.lock().files.insert(output.to_path_buf(), audio);
        Ok(())
    }
}

impl Default for FakeToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioToolkit for FakeToolkit {
    fn name(&self) -> &str {
        "fake-sox"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn supported_decode_formats(&self) -> Result<BTreeSet<String>> {
        self.record(ToolkitCall::FormatQuery);
        match &self.formats {
            Some(formats) => Ok(formats.iter().cloned().collect()),
            None => Err(LetMeHearError::CommandFailed {
                command: "fake-sox -h".to_string(),
                exit_code: 1,
                stderr: "help unavailable".to_string(),
            }),
        }
    }

    fn probe_duration_seconds(&self, path: &Path) -> Result<f64> {
        self.record(ToolkitCall::ProbeDuration(path.to_path_buf()));
        Ok(self.lookup("duration", path)?.duration_secs)
    }

    fn probe_sample_rate_hz(&self, path: &Path) -> Result<u32> {
        self.record(ToolkitCall::ProbeSampleRate(path.to_path_buf()));
        Ok(self.lookup("sample rate", path)?.sample_rate)
    }

    fn resample(&self, input: &Path, target_rate_hz: u32, output: &Path) -> Result<()> {
        self.record(ToolkitCall::Resample {
            input: input.to_path_buf(),
            target_rate_hz,
            output: output.to_path_buf(),
        });
        let source = self.lookup("sample rate", input)?;
        self.produce(
            output,
            FakeAudio {
                sample_rate: target_rate_hz,
                duration_secs: source.duration_secs,
            },
        )
    }

    fn concatenate(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        speed_ratio: Option<f64>,
    ) -> Result<()> {
        self.record(ToolkitCall::Concatenate {
            inputs: inputs.to_vec(),
            output: output.to_path_buf(),
            speed_ratio,
        });
        if self.fail_concatenate {
            return Err(LetMeHearError::CommandFailed {
                command: format!("fake-sox --combine concatenate {}", output.display()),
                exit_code: 2,
                stderr: "simulated failure".to_string(),
            });
        }

        let mut total = 0.0;
        let mut sample_rate = DEFAULT_SAMPLE_RATE;
        for input in inputs {
            let audio = self.lookup("duration", input)?;
            total += audio.duration_secs;
            sample_rate = audio.sample_rate;
        }
        self.produce(
            output,
            FakeAudio {
                sample_rate,
                duration_secs: total / speed_ratio.unwrap_or(1.0),
            },
        )
    }

    fn trim_extract(
        &self,
        input: &Path,
        start_secs: f64,
        length_secs: f64,
        output: &Path,
    ) -> Result<()> {
        self.record(ToolkitCall::TrimExtract {
            input: input.to_path_buf(),
            start_secs,
            length_secs,
            output: output.to_path_buf(),
        });

        let file_name = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.failing_trims.contains(&file_name) {
            return Err(LetMeHearError::CommandFailed {
                command: format!("fake-sox {} trim", output.display()),
                exit_code: 2,
                stderr: "simulated failure".to_string(),
            });
        }

        let source = self.lookup("duration", input)?;
        let available = (source.duration_secs - start_secs).max(0.0);
        self.produce(
            output,
            FakeAudio {
                sample_rate: source.sample_rate,
                duration_secs: available.min(length_secs),
            },
        )
    }
}
