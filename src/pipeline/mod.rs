//! Pipeline orchestration
//!
//! Ties scanning, harmonization, assembly, planning and segmentation
//! together per group and collects the outcome in a [`RunReport`].

mod orchestrator;
mod report;

pub use orchestrator::{Pipeline, PLACEHOLDER_DURATION_SECS};
pub use report::{GroupFailure, GroupReport, RunReport};
