//! Processing configuration
//!
//! A [`ProcessingConfig`] is built once, validated, and then shared read-only
//! by every stage and every group of a run.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{LetMeHearError, Result};

/// Default length of one output part, in seconds.
pub const DEFAULT_PART_LENGTH_SECS: f64 = 180.0;

/// Default overlap between consecutive parts, in seconds.
pub const DEFAULT_BACKSHIFT_SECS: f64 = 1.0;

/// Immutable settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingConfig {
    part_length: f64,
    backshift: f64,
    speed_ratio: Option<f64>,
    recursive: bool,
    dry_run: bool,
    destination_path: Option<PathBuf>,
    jobs: usize,
}

impl ProcessingConfig {
    /// Start building a configuration with the default part length and backshift.
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder::default()
    }

    /// Length of each output part in seconds.
    pub fn part_length(&self) -> f64 {
        self.part_length
    }

    /// Seconds every part after the first is pulled back by.
    pub fn backshift(&self) -> f64 {
        self.backshift
    }

    pub fn speed_ratio(&self) -> Option<f64> {
        self.speed_ratio
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Absolute destination root, if output should not go next to the sources.
    pub fn destination_path(&self) -> Option<&Path> {
        self.destination_path.as_deref()
    }

    /// Number of groups processed concurrently.
    pub fn jobs(&self) -> usize {
        self.jobs
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            part_length: DEFAULT_PART_LENGTH_SECS,
            backshift: DEFAULT_BACKSHIFT_SECS,
            speed_ratio: None,
            recursive: false,
            dry_run: false,
            destination_path: None,
            jobs: 1,
        }
    }
}

/// Builder for [`ProcessingConfig`]. Validation happens in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct ProcessingConfigBuilder {
    config: ProcessingConfig,
}

impl ProcessingConfigBuilder {
    pub fn part_length(mut self, seconds: f64) -> Self {
        self.config.part_length = seconds;
        self
    }

    pub fn backshift(mut self, seconds: f64) -> Self {
        self.config.backshift = seconds;
        self
    }

    pub fn speed_ratio(mut self, ratio: Option<f64>) -> Self {
        self.config.speed_ratio = ratio;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.recursive = recursive;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    pub fn destination_path<P: Into<PathBuf>>(mut self, path: Option<P>) -> Self {
        self.config.destination_path = path.map(Into::into);
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = jobs;
        self
    }

    /// Validate the settings and freeze them.
    ///
    /// A relative destination is resolved against the current directory.
    pub fn build(self) -> Result<ProcessingConfig> {
        let mut config = self.config;

        if !config.part_length.is_finite() || config.part_length <= 0.0 {
            return Err(LetMeHearError::config(format!(
                "part length must be a positive number of seconds, got {}",
                config.part_length
            )));
        }

        if !config.backshift.is_finite() || config.backshift < 0.0 {
            return Err(LetMeHearError::config(format!(
                "backshift must be zero or more seconds, got {}",
                config.backshift
            )));
        }

        if config.backshift >= config.part_length {
            return Err(LetMeHearError::config(format!(
                "backshift ({}s) must be shorter than part length ({}s)",
                config.backshift, config.part_length
            )));
        }

        if let Some(ratio) = config.speed_ratio {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(LetMeHearError::config(format!(
                    "speed ratio must be a positive number, got {}",
                    ratio
                )));
            }
        }

        if config.jobs == 0 {
            return Err(LetMeHearError::config("jobs must be at least 1"));
        }

        if let Some(destination) = config.destination_path.take() {
            let absolute = if destination.is_absolute() {
                destination
            } else {
                std::env::current_dir()?.join(destination)
            };
            config.destination_path = Some(absolute);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessingConfig::builder().build().unwrap();
        assert_eq!(config.part_length(), 180.0);
        assert_eq!(config.backshift(), 1.0);
        assert_eq!(config.speed_ratio(), None);
        assert_eq!(config.jobs(), 1);
        assert!(!config.dry_run());
        assert!(!config.recursive());
    }

    #[test]
    fn test_backshift_must_be_shorter_than_part_length() {
        let err = ProcessingConfig::builder()
            .part_length(10.0)
            .backshift(10.0)
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");

        assert!(ProcessingConfig::builder()
            .part_length(10.0)
            .backshift(12.0)
            .build()
            .is_err());
    }

    #[test]
    fn test_zero_part_length_rejected() {
        assert!(ProcessingConfig::builder()
            .part_length(0.0)
            .backshift(0.0)
            .build()
            .is_err());
    }

    #[test]
    fn test_zero_backshift_allowed() {
        let config = ProcessingConfig::builder()
            .part_length(60.0)
            .backshift(0.0)
            .build()
            .unwrap();
        assert_eq!(config.backshift(), 0.0);
    }

    #[test]
    fn test_speed_ratio_must_be_positive() {
        assert!(ProcessingConfig::builder()
            .speed_ratio(Some(0.0))
            .build()
            .is_err());
        assert!(ProcessingConfig::builder()
            .speed_ratio(Some(f64::NAN))
            .build()
            .is_err());
        assert!(ProcessingConfig::builder()
            .speed_ratio(Some(1.25))
            .build()
            .is_ok());
    }

    #[test]
    fn test_zero_jobs_rejected() {
        assert!(ProcessingConfig::builder().jobs(0).build().is_err());
    }

    #[test]
    fn test_relative_destination_is_absolutized() {
        let config = ProcessingConfig::builder()
            .destination_path(Some("out"))
            .build()
            .unwrap();
        let destination = config.destination_path().unwrap();
        assert!(destination.is_absolute());
        assert!(destination.ends_with("out"));
    }
}
