//! Partition planning
//!
//! Decides how many parts a recording is cut into and where each starts.
//! Every part after the first starts `backshift` seconds earlier per preceding
//! part than a plain split would, so neighbouring parts overlap and no phrase
//! is lost at a cut:
//!
//! ```text
//! parts_count  = round(total / (part_length - backshift))
//! start_offset = index * part_length - index * backshift
//! ```
//!
//! Ties round up (`2.5` parts become 3).

use serde::Serialize;

use crate::error::{LetMeHearError, Result};

/// Extension of the produced part files.
pub const PART_EXTENSION: &str = "mp3";

/// One planned output part
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    /// 1-based position
    pub index: usize,
    /// Seconds into the intermediate track
    pub start_offset: f64,
    /// Nominal length; the last part may hold less audio
    pub length: f64,
}

impl Part {
    /// Output file name, zero-padded to `width` digits.
    pub fn file_name(&self, width: usize) -> String {
        format!("{:0width$}.{}", self.index, PART_EXTENSION, width = width)
    }
}

/// Where every part of one recording starts and how long it is
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionPlan {
    pub total_duration: f64,
    pub parts: Vec<Part>,
}

impl PartitionPlan {
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Digits needed to number every part.
    pub fn pad_width(&self) -> usize {
        self.parts.len().max(1).to_string().len()
    }

    /// Output file names in part order.
    pub fn file_names(&self) -> Vec<String> {
        let width = self.pad_width();
        self.parts.iter().map(|part| part.file_name(width)).collect()
    }
}

/// Number of parts for a recording of `total_duration` seconds.
pub fn parts_count(total_duration: f64, part_length: f64, backshift: f64) -> Result<usize> {
    validate(part_length, backshift)?;

    if !total_duration.is_finite() {
        return Err(LetMeHearError::config(format!(
            "cannot plan parts of a recording lasting {} seconds",
            total_duration
        )));
    }
    if total_duration <= part_length {
        return Ok(1);
    }

    // Possum formula: positive operands, so `round` is round-half-up here.
    let count = (total_duration / (part_length - backshift)).round();
    Ok((count as usize).max(1))
}

/// Plan the parts of a recording of `total_duration` seconds.
pub fn plan_partitions(
    total_duration: f64,
    part_length: f64,
    backshift: f64,
) -> Result<PartitionPlan> {
    let count = parts_count(total_duration, part_length, backshift)?;

    let parts = (0..count)
        .map(|index| {
            let offset = index as f64 * part_length - index as f64 * backshift;
            Part {
                index: index + 1,
                start_offset: offset,
                length: part_length,
            }
        })
        .collect();

    Ok(PartitionPlan {
        total_duration,
        parts,
    })
}

fn validate(part_length: f64, backshift: f64) -> Result<()> {
    let valid = part_length.is_finite()
        && part_length > 0.0
        && backshift >= 0.0
        && backshift < part_length;
    if !valid {
        return Err(LetMeHearError::config(format!(
            "cannot plan parts of {}s with a backshift of {}s",
            part_length, backshift
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    #[test]
    fn test_reference_example() {
        let plan = plan_partitions(600.0, 180.0, 1.0).unwrap();

        assert_eq!(plan.len(), 3);
        let offsets: Vec<f64> = plan.parts.iter().map(|p| p.start_offset).collect();
        assert_eq!(offsets, vec![0.0, 179.0, 358.0]);
        assert!(plan.parts.iter().all(|p| p.length == 180.0));
        assert_eq!(plan.file_names(), vec!["1.mp3", "2.mp3", "3.mp3"]);
    }

    #[test_case(0.0 ; "empty recording")]
    #[test_case(42.5 ; "shorter than a part")]
    #[test_case(180.0 ; "exactly one part")]
    fn test_short_recording_is_one_part(total: f64) {
        let plan = plan_partitions(total, 180.0, 1.0).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.parts[0].index, 1);
        assert_eq!(plan.parts[0].start_offset, 0.0);
        assert_eq!(plan.parts[0].length, 180.0);
    }

    #[test_case(268.5, 180.0, 1.0, 2 ; "tie at 1.5 rounds up")]
    #[test_case(447.5, 180.0, 1.0, 3 ; "tie at 2.5 rounds up")]
    #[test_case(1000.0, 180.0, 1.0, 6 ; "sentinel duration")]
    #[test_case(181.0, 180.0, 0.0, 1 ; "barely longer than a part")]
    #[test_case(3600.0, 300.0, 0.0, 12 ; "no backshift")]
    fn test_parts_count(total: f64, part_length: f64, backshift: f64, expected: usize) {
        assert_eq!(parts_count(total, part_length, backshift).unwrap(), expected);
    }

    #[test]
    fn test_offsets_are_monotonic_and_inside_recording() {
        for total in [181.0, 359.9, 777.7, 5400.0, 36_000.0] {
            for (part_length, backshift) in [(180.0, 1.0), (60.0, 0.0), (300.0, 15.0), (10.0, 9.5)] {
                let plan = plan_partitions(total, part_length, backshift).unwrap();
                assert_eq!(plan.parts[0].start_offset, 0.0);
                for pair in plan.parts.windows(2) {
                    assert!(pair[0].start_offset <= pair[1].start_offset);
                    assert_eq!(pair[0].index + 1, pair[1].index);
                }
                let last = plan.parts.last().unwrap();
                assert!(last.start_offset < total);
            }
        }
    }

    #[test]
    fn test_zero_backshift_is_contiguous() {
        let plan = plan_partitions(600.0, 200.0, 0.0).unwrap();
        let offsets: Vec<f64> = plan.parts.iter().map(|p| p.start_offset).collect();
        assert_eq!(offsets, vec![0.0, 200.0, 400.0]);
    }

    #[test]
    fn test_fractional_backshift() {
        let plan = plan_partitions(100.0, 30.0, 0.5).unwrap();
        assert_eq!(plan.len(), 3);
        assert_relative_eq!(plan.parts[2].start_offset, 59.0);
    }

    #[test]
    fn test_twelve_parts_are_zero_padded() {
        let plan = plan_partitions(3600.0, 300.0, 0.0).unwrap();
        let names = plan.file_names();
        assert_eq!(plan.pad_width(), 2);
        assert_eq!(names.first().unwrap(), "01.mp3");
        assert_eq!(names.last().unwrap(), "12.mp3");
        assert_eq!(names.len(), 12);
    }

    #[test_case(f64::INFINITY ; "infinite")]
    #[test_case(f64::NAN ; "not a number")]
    fn test_non_finite_duration_rejected(total: f64) {
        let err = plan_partitions(total, 180.0, 1.0).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_invalid_backshift_rejected() {
        assert!(plan_partitions(600.0, 180.0, 180.0).is_err());
        assert!(plan_partitions(600.0, 180.0, -1.0).is_err());
        assert!(plan_partitions(600.0, 0.0, 0.0).is_err());
    }
}
