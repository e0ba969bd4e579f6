//! Segmentation
//!
//! Cuts every planned part out of the intermediate track. Parts are
//! independent: a failed part is recorded and the next one is still tried.

use std::path::{Path, PathBuf};

use log::{error, info};
use serde::Serialize;

use super::assemble::IntermediateTrack;
use super::plan::PartitionPlan;
use crate::error::LetMeHearError;
use crate::toolkit::AudioToolkit;

/// Outcome of cutting one group's parts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentReport {
    /// Part files written (or, on a dry run, that would be written)
    pub produced: Vec<PathBuf>,
    /// Parts whose extraction failed
    pub failures: Vec<PartFailure>,
}

impl SegmentReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A part that could not be extracted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartFailure {
    pub index: usize,
    pub path: PathBuf,
    pub reason: String,
}

impl PartFailure {
    pub fn to_error(&self) -> LetMeHearError {
        LetMeHearError::Extraction {
            index: self.index,
            path: self.path.clone(),
            reason: self.reason.clone(),
        }
    }
}

/// Extract every part of `plan` from `track` into `target_dir`.
pub fn segment_track(
    toolkit: &dyn AudioToolkit,
    track: &IntermediateTrack,
    plan: &PartitionPlan,
    target_dir: &Path,
    dry_run: bool,
) -> SegmentReport {
    info!(
        "Chopping information:\n      Source file length: {} second(s)\n      \
         Parts count: {}",
        plan.total_duration,
        plan.len()
    );
    info!("Starting chopping...");

    let width = plan.pad_width();
    let total = plan.len();
    let mut report = SegmentReport::default();

    for (done, part) in plan.parts.iter().enumerate() {
        let output = target_dir.join(part.file_name(width));

        if !dry_run {
            if let Err(e) =
                toolkit.trim_extract(track.path(), part.start_offset, part.length, &output)
            {
                let failure = PartFailure {
                    index: part.index,
                    path: output,
                    reason: e.to_string(),
                };
                error!("{}", failure.to_error());
                report.failures.push(failure);
                continue;
            }
        }

        info!(
            "[{:>3.0}%] {} (from {}s)",
            (done + 1) as f64 / total as f64 * 100.0,
            output.display(),
            part.start_offset
        );
        report.produced.push(output);
    }

    info!("Chopped.");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::assemble::assemble_source;
    use crate::stages::harmonize::HarmonizedSources;
    use crate::stages::plan::plan_partitions;
    use crate::toolkit::{FakeToolkit, ToolkitCall};
    use tempfile::tempdir;

    fn track_of(toolkit: &FakeToolkit, dir: &Path, seconds: f64) -> IntermediateTrack {
        let source = dir.join("source.wav");
        std::fs::write(&source, b"").unwrap();
        let toolkit = toolkit.clone().with_audio(&source, 44100, seconds);
        let sources = HarmonizedSources {
            inputs: vec![source],
            temporaries: Vec::new(),
            target_rate_hz: 44100,
        };
        assemble_source(&toolkit, &sources, dir.join("track.flac"), None, false).unwrap()
    }

    #[test]
    fn test_every_part_is_extracted() {
        let dir = tempdir().unwrap();
        let toolkit = FakeToolkit::new();
        let track = track_of(&toolkit, dir.path(), 600.0);
        let plan = plan_partitions(600.0, 180.0, 1.0).unwrap();

        let report = segment_track(&toolkit, &track, &plan, dir.path(), false);

        assert!(report.is_complete());
        assert_eq!(
            report.produced,
            vec![
                dir.path().join("1.mp3"),
                dir.path().join("2.mp3"),
                dir.path().join("3.mp3")
            ]
        );
        let trims: Vec<(f64, f64)> = toolkit
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                ToolkitCall::TrimExtract {
                    start_secs,
                    length_secs,
                    ..
                } => Some((start_secs, length_secs)),
                _ => None,
            })
            .collect();
        assert_eq!(trims, vec![(0.0, 180.0), (179.0, 180.0), (358.0, 180.0)]);
        assert!(dir.path().join("3.mp3").is_file());
    }

    #[test]
    fn test_failed_part_does_not_stop_the_rest() {
        let dir = tempdir().unwrap();
        let toolkit = FakeToolkit::new().with_failing_trim("2.mp3");
        let track = track_of(&toolkit, dir.path(), 600.0);
        let plan = plan_partitions(600.0, 180.0, 1.0).unwrap();

        let report = segment_track(&toolkit, &track, &plan, dir.path(), false);

        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 2);
        assert_eq!(report.failures[0].to_error().error_code(), "EXTRACTION_ERROR");
        assert_eq!(
            report.produced,
            vec![dir.path().join("1.mp3"), dir.path().join("3.mp3")]
        );
    }

    #[test]
    fn test_dry_run_lists_parts_only() {
        let toolkit = FakeToolkit::new();
        let track_dir = Path::new("/book/letmehear");
        let plan = plan_partitions(1000.0, 180.0, 1.0).unwrap();
        let track = IntermediateTrack::for_path(track_dir.join("track.flac"));

        let report = segment_track(&toolkit, &track, &plan, track_dir, true);

        assert_eq!(report.produced.len(), 6);
        assert!(toolkit.calls().is_empty());
    }
}
