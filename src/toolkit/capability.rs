//! Audio toolkit trait and the format capability query
//!
//! Defines the interface the pipeline needs from an audio backend.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::Result;

/// Extensions assumed decodable when the toolkit cannot tell us.
pub const FALLBACK_FORMATS: &[&str] = &["wav"];

/// Trait that every audio backend must implement
///
/// Probes are read-only. `resample`, `concatenate` and `trim_extract`
/// write a new file and never touch their inputs.
pub trait AudioToolkit: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// Check if the toolkit is ready to use
    fn is_available(&self) -> bool;

    /// Lowercase extensions (no leading dot) the toolkit can decode
    fn supported_decode_formats(&self) -> Result<BTreeSet<String>>;

    /// Duration of an audio file in seconds
    fn probe_duration_seconds(&self, path: &Path) -> Result<f64>;

    /// Sample rate of an audio file in Hz
    fn probe_sample_rate_hz(&self, path: &Path) -> Result<u32>;

    /// Write a copy of `input` resampled to `target_rate_hz`
    fn resample(&self, input: &Path, target_rate_hz: u32, output: &Path) -> Result<()>;

    /// Join `inputs` in order into `output`, optionally changing the tempo
    ///
    /// A single input is copied (and re-encoded to the output's format).
    fn concatenate(&self, inputs: &[PathBuf], output: &Path, speed_ratio: Option<f64>)
        -> Result<()>;

    /// Write `length_secs` of audio starting at `start_secs` into `output`
    ///
    /// Extraction past the end of the input yields whatever audio remains.
    fn trim_extract(&self, input: &Path, start_secs: f64, length_secs: f64, output: &Path)
        -> Result<()>;
}

/// Ask the toolkit once which formats it can decode.
///
/// Falls back to [`FALLBACK_FORMATS`] when the query fails or returns
/// nothing usable. Entries are normalized to lowercase without a dot.
pub fn query_supported_formats(toolkit: &dyn AudioToolkit) -> BTreeSet<String> {
    let formats: BTreeSet<String> = match toolkit.supported_decode_formats() {
        Ok(formats) => formats
            .into_iter()
            .map(|format| format.trim().trim_start_matches('.').to_lowercase())
            .filter(|format| !format.is_empty())
            .collect(),
        Err(e) => {
            warn!("Unable to query supported audio formats: {}", e);
            BTreeSet::new()
        }
    };

    if formats.is_empty() {
        warn!(
            "Falling back to built-in audio formats: {}",
            FALLBACK_FORMATS.join(" ")
        );
        return FALLBACK_FORMATS.iter().map(|f| f.to_string()).collect();
    }

    debug!(
        "Supported audio formats: {}",
        formats.iter().cloned().collect::<Vec<_>>().join(" ")
    );
    formats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::FakeToolkit;

    #[test]
    fn test_formats_are_normalized() {
        let toolkit = FakeToolkit::new().with_formats(&[".MP3", "Flac", " ogg "]);
        let formats = query_supported_formats(&toolkit);
        let expected: BTreeSet<String> = ["flac", "mp3", "ogg"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(formats, expected);
    }

    #[test]
    fn test_empty_format_list_falls_back() {
        let toolkit = FakeToolkit::new().with_formats(&[]);
        let formats = query_supported_formats(&toolkit);
        assert_eq!(formats.len(), 1);
        assert!(formats.contains("wav"));
    }

    #[test]
    fn test_failed_query_falls_back() {
        let toolkit = FakeToolkit::new().failing_format_query();
        let formats = query_supported_formats(&toolkit);
        assert!(formats.contains("wav"));
    }
}
