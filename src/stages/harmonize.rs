//! Sample rate harmonization
//!
//! Files of a group may come at different sample rates. Only the files below
//! the group's highest rate are resampled, up to that rate; the rest are used
//! as they are.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::toolkit::AudioToolkit;

/// Container used for resampled copies and the intermediate track.
pub const INTERMEDIATE_EXTENSION: &str = "flac";

/// A file with its probed properties
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioFileDescriptor {
    pub path: PathBuf,
    pub sample_rate_hz: u32,
}

/// Output of harmonization: the inputs to assemble, in group order
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonizedSources {
    /// One path per group file; resampled copies replace mismatched originals
    pub inputs: Vec<PathBuf>,
    /// Resampled copies that must be removed at cleanup
    pub temporaries: Vec<PathBuf>,
    /// Rate every input now shares
    pub target_rate_hz: u32,
}

impl HarmonizedSources {
    pub fn resampled_count(&self) -> usize {
        self.temporaries.len()
    }
}

/// Deterministic name for a temporary derived from `source`.
///
/// SHA-256 of the absolute path string: stable across runs and distinct for
/// distinct sources.
pub fn temporary_file_name(source: &Path, extension: &str) -> String {
    let digest = Sha256::digest(source.to_string_lossy().as_bytes());
    format!("_letmehear_{:x}.tmp.{}", digest, extension)
}

/// Probe the sample rate of every file.
///
/// Any unreadable file fails the whole call.
pub fn probe_sample_rates(
    toolkit: &dyn AudioToolkit,
    files: &[PathBuf],
) -> Result<Vec<AudioFileDescriptor>> {
    files
        .iter()
        .map(|path| {
            let sample_rate_hz = toolkit.probe_sample_rate_hz(path)?;
            debug!("{}: {} Hz", path.display(), sample_rate_hz);
            Ok(AudioFileDescriptor {
                path: path.clone(),
                sample_rate_hz,
            })
        })
        .collect()
}

/// Bring every file of a group to the group's highest sample rate.
///
/// Resampled copies go into `target_dir`. With `dry_run` the copies are only
/// planned: their paths are returned but the toolkit is not asked to write them.
pub fn harmonize_sample_rates(
    toolkit: &dyn AudioToolkit,
    files: &[PathBuf],
    target_dir: &Path,
    dry_run: bool,
) -> Result<HarmonizedSources> {
    let descriptors = probe_sample_rates(toolkit, files)?;

    let min_rate = descriptors.iter().map(|d| d.sample_rate_hz).min();
    let max_rate = descriptors.iter().map(|d| d.sample_rate_hz).max();

    let (Some(min_rate), Some(max_rate)) = (min_rate, max_rate) else {
        return Ok(HarmonizedSources {
            inputs: Vec::new(),
            temporaries: Vec::new(),
            target_rate_hz: 0,
        });
    };

    if min_rate == max_rate {
        debug!("All files share a sample rate of {} Hz", max_rate);
        return Ok(HarmonizedSources {
            inputs: files.to_vec(),
            temporaries: Vec::new(),
            target_rate_hz: max_rate,
        });
    }

    info!(
        "Sample rates differ ({} - {} Hz), resampling to {} Hz...",
        min_rate, max_rate, max_rate
    );

    let mut inputs = Vec::with_capacity(descriptors.len());
    let mut temporaries = Vec::new();

    for descriptor in descriptors {
        if descriptor.sample_rate_hz == max_rate {
            inputs.push(descriptor.path);
            continue;
        }

        let resampled =
            target_dir.join(temporary_file_name(&descriptor.path, INTERMEDIATE_EXTENSION));
        info!(
            "Resampling {} ({} Hz) into {}",
            descriptor.path.display(),
            descriptor.sample_rate_hz,
            resampled.display()
        );
        if !dry_run {
            toolkit.resample(&descriptor.path, max_rate, &resampled)?;
        }

        inputs.push(resampled.clone());
        temporaries.push(resampled);
    }

    Ok(HarmonizedSources {
        inputs,
        temporaries,
        target_rate_hz: max_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::{FakeToolkit, ToolkitCall};

    #[test]
    fn test_single_file_is_left_alone() {
        let toolkit = FakeToolkit::new().with_audio("/book/01.mp3", 22050, 300.0);
        let files = vec![PathBuf::from("/book/01.mp3")];

        let harmonized =
            harmonize_sample_rates(&toolkit, &files, Path::new("/book/letmehear"), false).unwrap();

        assert_eq!(harmonized.inputs, files);
        assert_eq!(harmonized.resampled_count(), 0);
        assert_eq!(harmonized.target_rate_hz, 22050);
        assert!(toolkit.resample_calls().is_empty());
    }

    #[test]
    fn test_only_minority_rate_is_resampled() {
        let target = tempfile::tempdir().unwrap();
        let toolkit = FakeToolkit::new()
            .with_audio("/book/01.mp3", 48000, 100.0)
            .with_audio("/book/02.mp3", 44100, 100.0)
            .with_audio("/book/03.mp3", 48000, 100.0);
        let files: Vec<PathBuf> = ["/book/01.mp3", "/book/02.mp3", "/book/03.mp3"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let harmonized = harmonize_sample_rates(&toolkit, &files, target.path(), false).unwrap();

        let expected = target
            .path()
            .join(temporary_file_name(Path::new("/book/02.mp3"), "flac"));
        assert_eq!(harmonized.target_rate_hz, 48000);
        assert_eq!(
            harmonized.inputs,
            vec![files[0].clone(), expected.clone(), files[2].clone()]
        );
        assert_eq!(harmonized.temporaries, vec![expected.clone()]);
        assert_eq!(
            toolkit.resample_calls(),
            vec![ToolkitCall::Resample {
                input: files[1].clone(),
                target_rate_hz: 48000,
                output: expected,
            }]
        );
    }

    #[test]
    fn test_dry_run_plans_without_resampling() {
        let toolkit = FakeToolkit::new()
            .with_audio("/book/01.mp3", 44100, 100.0)
            .with_audio("/book/02.mp3", 48000, 100.0);
        let files = vec![PathBuf::from("/book/01.mp3"), PathBuf::from("/book/02.mp3")];

        let harmonized =
            harmonize_sample_rates(&toolkit, &files, Path::new("/book/letmehear"), true).unwrap();

        assert_eq!(harmonized.resampled_count(), 1);
        assert!(toolkit.mutating_calls().is_empty());
    }

    #[test]
    fn test_unreadable_file_fails() {
        let toolkit = FakeToolkit::new()
            .with_audio("/book/01.mp3", 44100, 100.0)
            .with_unreadable("/book/02.mp3");
        let files = vec![PathBuf::from("/book/01.mp3"), PathBuf::from("/book/02.mp3")];

        let err = harmonize_sample_rates(&toolkit, &files, Path::new("/tmp"), true).unwrap_err();
        assert_eq!(err.error_code(), "PROBE_ERROR");
    }

    #[test]
    fn test_temporary_names_are_deterministic() {
        let a = temporary_file_name(Path::new("/books/one/01.mp3"), "flac");
        let b = temporary_file_name(Path::new("/books/one/01.mp3"), "flac");
        let c = temporary_file_name(Path::new("/books/two/01.mp3"), "flac");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("_letmehear_"));
        assert!(a.ends_with(".tmp.flac"));
    }
}
