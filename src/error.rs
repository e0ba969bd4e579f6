//! Error handling for letmehear
//!
//! Errors are split by how far they reach: configuration, toolkit and probe
//! failures stop the whole run, while path creation and command failures
//! only take down the group being processed.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for letmehear operations
pub type Result<T> = std::result::Result<T, LetMeHearError>;

/// Main error type for letmehear operations
#[derive(Error, Debug)]
pub enum LetMeHearError {
    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Source path not found: {path}")]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Toolkit Errors
    #[error("Audio toolkit unavailable: {tool}: {reason}")]
    ToolkitUnavailable { tool: String, reason: String },

    #[error("Unable to probe {what} of {path}: {reason}")]
    Probe {
        what: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("Command failed ({exit_code}): {command}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Command timed out after {timeout_secs}s: {command}")]
    CommandTimedOut { command: String, timeout_secs: u64 },

    // Filesystem Errors
    #[error("Unable to create target path: {path}: {source}")]
    PathCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Segmentation Errors
    #[error("Failed to extract part {index} into {path}: {reason}")]
    Extraction {
        index: usize,
        path: PathBuf,
        reason: String,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LetMeHearError {
    /// Shorthand for a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        LetMeHearError::Config {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            LetMeHearError::Config { .. } => "CONFIG_ERROR",
            LetMeHearError::SourceNotFound { .. } => "SOURCE_NOT_FOUND",
            LetMeHearError::ToolkitUnavailable { .. } => "TOOLKIT_UNAVAILABLE",
            LetMeHearError::Probe { .. } => "PROBE_ERROR",
            LetMeHearError::CommandFailed { .. } => "COMMAND_FAILED",
            LetMeHearError::CommandTimedOut { .. } => "COMMAND_TIMED_OUT",
            LetMeHearError::PathCreation { .. } => "PATH_CREATION_ERROR",
            LetMeHearError::Extraction { .. } => "EXTRACTION_ERROR",
            LetMeHearError::Io(_) => "IO_ERROR",
            LetMeHearError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Process exit code reported by the CLI for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            LetMeHearError::Config { .. } | LetMeHearError::SourceNotFound { .. } => 2,
            LetMeHearError::ToolkitUnavailable { .. } => 3,
            LetMeHearError::Probe { .. } => 4,
            LetMeHearError::PathCreation { .. } => 5,
            LetMeHearError::Extraction { .. } => 6,
            LetMeHearError::CommandFailed { .. } | LetMeHearError::CommandTimedOut { .. } => 7,
            LetMeHearError::Io(_) | LetMeHearError::Serialization(_) => 1,
        }
    }

    /// Whether the failure is confined to a single group.
    ///
    /// Group-scoped errors are recorded in that group's report and the run
    /// moves on to the next group. Everything else aborts the run.
    pub fn is_group_scoped(&self) -> bool {
        matches!(
            self,
            LetMeHearError::PathCreation { .. }
                | LetMeHearError::CommandFailed { .. }
                | LetMeHearError::CommandTimedOut { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            LetMeHearError::Config { .. } => {
                Some("Check that the backshift is shorter than the part length.")
            }
            LetMeHearError::SourceNotFound { .. } => Some("Check the source path and try again."),
            LetMeHearError::ToolkitUnavailable { .. } => Some(
                "Install SoX with format plugins (e.g. `sox` and `libsox-fmt-all`) \
                 or set LETMEHEAR_SOX_PATH.",
            ),
            LetMeHearError::Probe { .. } => {
                Some("The file may be corrupted or in a format SoX cannot read.")
            }
            LetMeHearError::CommandTimedOut { .. } => {
                Some("Raise LETMEHEAR_TOOL_TIMEOUT_SECS for very long recordings.")
            }
            LetMeHearError::PathCreation { .. } => {
                Some("Check permissions of the destination directory.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = LetMeHearError::config("backshift must be shorter than part length");
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let probe = LetMeHearError::Probe {
            what: "sample rate",
            path: PathBuf::from("a.mp3"),
            reason: "unreadable".to_string(),
        };
        let unavailable = LetMeHearError::ToolkitUnavailable {
            tool: "sox".to_string(),
            reason: "not found".to_string(),
        };
        let path = LetMeHearError::PathCreation {
            path: PathBuf::from("/root/out"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };

        assert_eq!(probe.exit_code(), 4);
        assert_eq!(unavailable.exit_code(), 3);
        assert_eq!(path.exit_code(), 5);
    }

    #[test]
    fn test_group_scope() {
        let failed = LetMeHearError::CommandFailed {
            command: "sox a.mp3 b.flac".to_string(),
            exit_code: 2,
            stderr: String::new(),
        };
        assert!(failed.is_group_scoped());

        let probe = LetMeHearError::Probe {
            what: "duration",
            path: PathBuf::from("a.mp3"),
            reason: "unreadable".to_string(),
        };
        assert!(!probe.is_group_scoped());
        assert!(probe.recovery_suggestion().is_some());
    }
}
