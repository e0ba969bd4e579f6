//! letmehear - Re-split audiobooks into overlapping parts
//!
//! Every directory holding supported audio files is treated as one group.
//! A group's files are joined into a single track (resampled first when
//! their sample rates differ) and cut into parts of a fixed length. Each
//! part starts a little before the previous one ended, so nothing is lost
//! at part boundaries on players that do not resume mid-file.
//!
//! # Architecture
//!
//! - [`toolkit`]: the audio backend (SoX via subprocesses, or a fake for tests)
//! - [`stages`]: scan, harmonize, assemble, plan and segment
//! - [`pipeline`]: runs groups through the stages and reports on them
//! - [`cli`]: command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod stages;
pub mod toolkit;

pub use config::ProcessingConfig;
pub use error::{LetMeHearError, Result};
pub use pipeline::{Pipeline, RunReport};
pub use stages::{plan_partitions, Part, PartitionPlan};
pub use toolkit::{AudioToolkit, SoxToolkit};
