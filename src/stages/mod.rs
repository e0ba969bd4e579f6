//! Processing stages
//!
//! Each stage consumes the record produced by the previous one:
//! - Scan: directories into `SourceGroup`s
//! - Harmonize: one sample rate per group
//! - Assemble: one intermediate track per group
//! - Plan: part boundaries from the track's duration
//! - Segment: part files from the plan

pub mod assemble;
pub mod harmonize;
pub mod plan;
pub mod scan;
pub mod segment;

pub use assemble::{assemble_source, intermediate_track_path, IntermediateTrack};
pub use harmonize::{
    harmonize_sample_rates, probe_sample_rates, temporary_file_name, AudioFileDescriptor,
    HarmonizedSources, INTERMEDIATE_EXTENSION,
};
pub use plan::{parts_count, plan_partitions, Part, PartitionPlan, PART_EXTENSION};
pub use scan::{scan_source_groups, SourceGroup, OUTPUT_DIR_NAME};
pub use segment::{segment_track, PartFailure, SegmentReport};
