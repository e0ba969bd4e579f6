//! Run reports
//!
//! What happened to every group of a run, in a form that can be printed
//! or serialized to JSON.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::LetMeHearError;
use crate::stages::{PartitionPlan, SegmentReport, SourceGroup};

/// Why a group could not be finished
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupFailure {
    pub code: &'static str,
    pub exit_code: u8,
    pub message: String,
}

impl From<&LetMeHearError> for GroupFailure {
    fn from(err: &LetMeHearError) -> Self {
        Self {
            code: err.error_code(),
            exit_code: err.exit_code(),
            message: err.to_string(),
        }
    }
}

/// Outcome of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub files: usize,
    pub resampled: usize,
    pub plan: Option<PartitionPlan>,
    pub segments: SegmentReport,
    pub failure: Option<GroupFailure>,
}

impl GroupReport {
    pub fn new(group: &SourceGroup, target_path: &Path) -> Self {
        Self {
            source_path: group.path().to_path_buf(),
            target_path: target_path.to_path_buf(),
            files: group.files().len(),
            resampled: 0,
            plan: None,
            segments: SegmentReport::default(),
            failure: None,
        }
    }

    /// Whether every stage ran and every part was extracted.
    pub fn is_success(&self) -> bool {
        self.failure.is_none() && self.segments.is_complete()
    }

    /// Exit code this group alone would warrant (0 on success).
    pub fn exit_code(&self) -> u8 {
        if let Some(failure) = &self.failure {
            return failure.exit_code;
        }
        match self.segments.failures.first() {
            Some(part) => part.to_error().exit_code(),
            None => 0,
        }
    }
}

/// Outcome of a whole run, groups in sorted path order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub groups: Vec<GroupReport>,
}

impl RunReport {
    pub fn total_parts(&self) -> usize {
        self.groups.iter().map(|g| g.segments.produced.len()).sum()
    }

    pub fn failed_groups(&self) -> usize {
        self.groups.iter().filter(|g| !g.is_success()).count()
    }

    /// Exit code of the first group that did not fully succeed, or 0.
    pub fn exit_code(&self) -> u8 {
        self.groups
            .iter()
            .map(GroupReport::exit_code)
            .find(|code| *code != 0)
            .unwrap_or(0)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
