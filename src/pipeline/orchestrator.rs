//! Pipeline orchestrator
//!
//! Runs every group through the stages in order:
//!
//! 1. Ensure the target path exists
//! 2. Harmonize sample rates
//! 3. Assemble the intermediate track
//! 4. Plan parts from the track's duration
//! 5. Cut the parts
//! 6. Remove intermediates
//!
//! On a dry run nothing is written and no mutating toolkit call is made;
//! the intermediate track's duration is then [`PLACEHOLDER_DURATION_SECS`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};
use rayon::prelude::*;

use super::report::{GroupFailure, GroupReport, RunReport};
use crate::config::ProcessingConfig;
use crate::error::{LetMeHearError, Result};
use crate::stages::{
    assemble_source, harmonize_sample_rates, intermediate_track_path, plan_partitions,
    scan_source_groups, segment_track, temporary_file_name, IntermediateTrack, SourceGroup,
    INTERMEDIATE_EXTENSION, OUTPUT_DIR_NAME,
};
use crate::toolkit::{query_supported_formats, AudioToolkit};

/// Duration assumed for a track that cannot be probed, or does not exist yet.
pub const PLACEHOLDER_DURATION_SECS: f64 = 1000.0;

/// Drives groups of audio files through the processing stages
pub struct Pipeline {
    toolkit: Arc<dyn AudioToolkit>,
    config: ProcessingConfig,
}

impl Pipeline {
    pub fn new(toolkit: Arc<dyn AudioToolkit>, config: ProcessingConfig) -> Self {
        Self { toolkit, config }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Output directory for the group at `group_path`.
    pub fn target_path(&self, group_path: &Path) -> PathBuf {
        match self.config.destination_path() {
            Some(destination) => match group_path.file_name() {
                Some(name) => destination.join(name),
                None => destination.to_path_buf(),
            },
            None => group_path.join(OUTPUT_DIR_NAME),
        }
    }

    /// Process every group found under `source_path`.
    ///
    /// Errors abort the run; failures confined to one group are recorded in
    /// the returned report instead.
    pub fn run(&self, source_path: &Path) -> Result<RunReport> {
        info!("Source path: {}", source_path.display());
        let source = fs::canonicalize(source_path).map_err(|e| LetMeHearError::SourceNotFound {
            path: source_path.to_path_buf(),
            source: e,
        })?;
        if !source.is_dir() {
            return Err(LetMeHearError::config(format!(
                "source path is not a directory: {}",
                source.display()
            )));
        }

        if !self.toolkit.is_available() {
            return Err(LetMeHearError::ToolkitUnavailable {
                tool: self.toolkit.name().to_string(),
                reason: "the audio toolkit did not respond".to_string(),
            });
        }

        let formats = query_supported_formats(self.toolkit.as_ref());

        if let Some(destination) = self.config.destination_path() {
            self.ensure_target_path(destination)?;
        }

        let groups = scan_source_groups(&source, self.config.recursive(), &formats)?;
        if groups.is_empty() {
            warn!("No supported audio files found under {}", source.display());
        }

        let reports = if self.config.jobs() > 1 && groups.len() > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.jobs())
                .build()
                .map_err(|e| LetMeHearError::config(format!("unable to start workers: {}", e)))?;
            pool.install(|| {
                groups
                    .par_iter()
                    .map(|group| self.process_group(group))
                    .collect::<Result<Vec<_>>>()
            })?
        } else {
            groups
                .iter()
                .map(|group| self.process_group(group))
                .collect::<Result<Vec<_>>>()?
        };

        let report = RunReport {
            dry_run: self.config.dry_run(),
            groups: reports,
        };
        info!(
            "We are done now. {} group(s), {} part(s), {} group(s) with failures.",
            report.groups.len(),
            report.total_parts(),
            report.failed_groups()
        );
        Ok(report)
    }

    /// Run one group through every stage and clean up after it.
    pub fn process_group(&self, group: &SourceGroup) -> Result<GroupReport> {
        info!(
            "{}\n      Working on: {}\n",
            "====".repeat(10),
            group.path().display()
        );
        let target = self.target_path(group.path());
        info!("Target (output) path: {}", target.display());

        let mut report = GroupReport::new(group, &target);
        match self.run_stages(group, &target, &mut report) {
            Ok(()) => {}
            Err(e) if e.is_group_scoped() => {
                error!("Giving up on {}: {}", group.path().display(), e);
                report.failure = Some(GroupFailure::from(&e));
            }
            Err(e) => return Err(e),
        }

        if !self.config.dry_run() {
            self.remove_intermediates(group, &target);
        }
        Ok(report)
    }

    fn run_stages(
        &self,
        group: &SourceGroup,
        target: &Path,
        report: &mut GroupReport,
    ) -> Result<()> {
        let toolkit = self.toolkit.as_ref();
        let dry_run = self.config.dry_run();

        self.ensure_target_path(target)?;

        let harmonized = harmonize_sample_rates(toolkit, &group.file_paths(), target, dry_run)?;
        report.resampled = harmonized.resampled_count();

        let track = assemble_source(
            toolkit,
            &harmonized,
            intermediate_track_path(group.path(), target),
            self.config.speed_ratio(),
            dry_run,
        )?;

        let duration = self.track_duration(&track);
        let plan = plan_partitions(duration, self.config.part_length(), self.config.backshift())?;
        info!(
            "Requested part length: {} second(s), backshift: {} second(s), parts: {}",
            self.config.part_length(),
            self.config.backshift(),
            plan.len()
        );

        report.segments = segment_track(toolkit, &track, &plan, target, dry_run);
        report.plan = Some(plan);
        Ok(())
    }

    fn ensure_target_path(&self, path: &Path) -> Result<()> {
        if path.is_dir() || self.config.dry_run() {
            return Ok(());
        }
        debug!("Creating target path: {}...", path.display());
        fs::create_dir_all(path).map_err(|e| LetMeHearError::PathCreation {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn track_duration(&self, track: &IntermediateTrack) -> f64 {
        info!("Getting source file length...");
        if self.config.dry_run() {
            return PLACEHOLDER_DURATION_SECS;
        }
        match self.toolkit.probe_duration_seconds(track.path()) {
            Ok(seconds) if seconds.is_finite() => seconds,
            Ok(seconds) => {
                warn!(
                    "{} reports a duration of {}; assuming {} seconds",
                    track.path().display(),
                    seconds,
                    PLACEHOLDER_DURATION_SECS
                );
                PLACEHOLDER_DURATION_SECS
            }
            Err(e) => {
                warn!("{}; assuming {} seconds", e, PLACEHOLDER_DURATION_SECS);
                PLACEHOLDER_DURATION_SECS
            }
        }
    }

    /// Remove the intermediate track and any resampled copies of the group.
    fn remove_intermediates(&self, group: &SourceGroup, target: &Path) {
        let candidates = std::iter::once(intermediate_track_path(group.path(), target)).chain(
            group
                .file_paths()
                .into_iter()
                .map(|file| target.join(temporary_file_name(&file, INTERMEDIATE_EXTENSION))),
        );

        for path in candidates.filter(|path| path.exists()) {
            debug!("Removing {}", path.display());
            if let Err(e) = fs::remove_file(&path) {
                warn!("Unable to remove {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::FakeToolkit;

    fn pipeline(config: ProcessingConfig) -> Pipeline {
        Pipeline::new(Arc::new(FakeToolkit::new()), config)
    }

    #[test]
    fn test_default_target_is_next_to_sources() {
        let pipeline = pipeline(ProcessingConfig::default());
        assert_eq!(
            pipeline.target_path(Path::new("/books/dune")),
            PathBuf::from("/books/dune/letmehear")
        );
    }

    #[test]
    fn test_destination_target_uses_group_name() {
        let config = ProcessingConfig::builder()
            .destination_path(Some("/player"))
            .build()
            .unwrap();
        let pipeline = pipeline(config);
        assert_eq!(
            pipeline.target_path(Path::new("/books/dune")),
            PathBuf::from("/player/dune")
        );
    }

    #[test]
    fn test_missing_source_is_rejected() {
        let err = pipeline(ProcessingConfig::default())
            .run(Path::new("/letmehear/definitely/missing"))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_non_finite_track_duration_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::write(root.join("book.mp3"), b"audio").unwrap();
        let toolkit = FakeToolkit::new().with_audio(root.join("book.mp3"), 44100, f64::INFINITY);

        let report = Pipeline::new(Arc::new(toolkit), ProcessingConfig::default())
            .run(&root)
            .unwrap();

        let plan = report.groups[0].plan.as_ref().unwrap();
        assert_eq!(plan.total_duration, PLACEHOLDER_DURATION_SECS);
        assert_eq!(plan.len(), 6);
    }

    #[test]
    fn test_unavailable_toolkit_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(
            Arc::new(FakeToolkit::new().unavailable()),
            ProcessingConfig::default(),
        );
        let err = pipeline.run(dir.path()).unwrap_err();
        assert_eq!(err.error_code(), "TOOLKIT_UNAVAILABLE");
    }
}
