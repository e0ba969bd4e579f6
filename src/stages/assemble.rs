//! Source assembly
//!
//! Turns the harmonized inputs of a group into one lossless intermediate
//! track that all parts are cut from.

use std::path::{Path, PathBuf};

use log::{debug, info};

use super::harmonize::{temporary_file_name, HarmonizedSources, INTERMEDIATE_EXTENSION};
use crate::error::Result;
use crate::toolkit::AudioToolkit;

/// The single concatenated source of one group
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateTrack {
    path: PathBuf,
}

impl IntermediateTrack {
    pub(crate) fn for_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Where the intermediate track of `group_path` lives inside `target_dir`.
///
/// The name is derived from the group path so that groups sharing a target
/// directory never overwrite each other's track.
pub fn intermediate_track_path(group_path: &Path, target_dir: &Path) -> PathBuf {
    target_dir.join(temporary_file_name(group_path, INTERMEDIATE_EXTENSION))
}

/// Concatenate (or, for a single input, re-encode) the sources into `output`.
///
/// With `dry_run` nothing is written and only the track path is returned.
pub fn assemble_source(
    toolkit: &dyn AudioToolkit,
    sources: &HarmonizedSources,
    output: PathBuf,
    speed_ratio: Option<f64>,
    dry_run: bool,
) -> Result<IntermediateTrack> {
    debug!(
        "Source file will be made from:\n{}",
        sources
            .inputs
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    );

    if sources.inputs.len() == 1 {
        info!("Making source file (single input): {}", output.display());
    } else {
        info!(
            "Making source file from {} inputs: {}",
            sources.inputs.len(),
            output.display()
        );
    }
    if let Some(ratio) = speed_ratio {
        info!("Applying speed ratio {}", ratio);
    }

    if !dry_run {
        toolkit.concatenate(&sources.inputs, &output, speed_ratio)?;
    }

    Ok(IntermediateTrack::for_path(output))
}
