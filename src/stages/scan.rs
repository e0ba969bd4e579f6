//! Source group scanning
//!
//! Every directory holding supported audio files becomes one group. Files
//! of a directory are never merged with those of its subdirectories.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;

/// Name of the default output directory, skipped while scanning.
pub const OUTPUT_DIR_NAME: &str = "letmehear";

/// One directory's worth of input audio, treated as one recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceGroup {
    path: PathBuf,
    files: Vec<String>,
}

impl SourceGroup {
    /// Create a group; file names are sorted lexicographically.
    pub fn new(path: impl Into<PathBuf>, mut files: Vec<String>) -> Self {
        files.sort();
        Self {
            path: path.into(),
            files,
        }
    }

    /// Directory the files live in
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File names in concatenation order
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Absolute paths of the files, in concatenation order
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|name| self.path.join(name)).collect()
    }
}

/// Enumerate groups of supported audio files under `root`.
///
/// `supported` holds lowercase extensions without a dot. Groups come back
/// sorted by directory path; directories without matching files are left out.
pub fn scan_source_groups(
    root: &Path,
    recursive: bool,
    supported: &BTreeSet<String>,
) -> Result<Vec<SourceGroup>> {
    info!(
        "Enumerating files under the source path (recursive={})...",
        recursive
    );

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut found: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();

    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|entry| !is_output_dir(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
            Err(e) => return Err(std::io::Error::from(e).into()),
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            warn!(
                "Skipping file with a non UTF-8 name: {}",
                entry.path().display()
            );
            continue;
        };

        if !has_supported_extension(name, supported) {
            continue;
        }

        let dir = entry
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf());
        found.entry(dir).or_default().push(name.to_string());
    }

    info!("Filtering audio files...");
    let groups: Vec<SourceGroup> = found
        .into_iter()
        .map(|(path, files)| SourceGroup::new(path, files))
        .collect();

    for group in &groups {
        debug!(
            "Group {}: {} file(s)",
            group.path().display(),
            group.files().len()
        );
    }

    Ok(groups)
}

fn is_output_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == OUTPUT_DIR_NAME
}

fn has_supported_extension(name: &str, supported: &BTreeSet<String>) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| supported.contains(&ext.to_lowercase()))
        .unwrap_or(false)
}
