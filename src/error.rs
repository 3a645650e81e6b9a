/*!
 * Error types for orbit-snapshot
 */

use std::fmt;
use std::io;

use crate::system::SystemError;

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug)]
pub enum SnapshotError {
    /// Configuration file unreadable, malformed or invalid
    Config(String),

    /// A configured volume is absent from the provider's volume listing
    NotFound { volume: String },

    /// A provider call (list, create, destroy) failed
    Provider {
        operation: String,
        target: String,
        message: String,
    },

    /// Snapshot creation target already exists
    Duplicate { snapshot: String },

    /// The provider binary could not be executed
    Io(io::Error),

    /// Per-volume failure with the step that was running when it happened
    VolumeFailed {
        volume: String,
        step: String,
        source: Box<SnapshotError>,
    },
}

impl SnapshotError {
    /// Wrap this error with the volume and step it occurred in
    pub fn in_volume(self, volume: &str, step: impl Into<String>) -> Self {
        SnapshotError::VolumeFailed {
            volume: volume.to_string(),
            step: step.into(),
            source: Box::new(self),
        }
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SnapshotError::Config(_) => EXIT_FATAL,
            _ => EXIT_PARTIAL,
        }
    }

    /// Innermost error, skipping volume context wrappers
    pub fn root_cause(&self) -> &SnapshotError {
        match self {
            SnapshotError::VolumeFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            SnapshotError::Config(_) => ErrorCategory::Configuration,
            SnapshotError::NotFound { .. } => ErrorCategory::Validation,
            SnapshotError::Provider { .. } => ErrorCategory::Provider,
            SnapshotError::Duplicate { .. } => ErrorCategory::Conflict,
            SnapshotError::Io(_) => ErrorCategory::IoError,
            SnapshotError::VolumeFailed { source, .. } => source.category(),
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing volumes
    Validation,
    /// I/O operation errors
    IoError,
    /// Configuration errors
    Configuration,
    /// Failed zfs commands
    Provider,
    /// Snapshot name already taken
    Conflict,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Provider => write!(f, "provider"),
            ErrorCategory::Conflict => write!(f, "conflict"),
        }
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            SnapshotError::NotFound { volume } => {
                write!(f, "No volume found with name {}", volume)
            }
            SnapshotError::Provider {
                operation,
                target,
                message,
            } => {
                write!(f, "zfs {} {} failed: {}", operation, target, message)
            }
            SnapshotError::Duplicate { snapshot } => {
                write!(f, "Snapshot already exists: {}", snapshot)
            }
            SnapshotError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
            SnapshotError::VolumeFailed {
                volume,
                step,
                source,
            } => {
                write!(f, "Volume {} ({}): {}", volume, step, source)
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Io(err) => Some(err),
            SnapshotError::VolumeFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for SnapshotError {
    fn from(err: io::Error) -> Self {
        SnapshotError::Io(err)
    }
}

impl From<toml::de::Error> for SnapshotError {
    fn from(err: toml::de::Error) -> Self {
        SnapshotError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<SystemError> for SnapshotError {
    fn from(err: SystemError) -> Self {
        match err {
            SystemError::VolumeNotFound(volume) => SnapshotError::NotFound { volume },
            SystemError::AlreadyExists(snapshot) => SnapshotError::Duplicate { snapshot },
            SystemError::CommandFailed {
                operation,
                target,
                output,
            } => SnapshotError::Provider {
                operation,
                target,
                message: output,
            },
            SystemError::Io(err) => SnapshotError::Io(err),
        }
    }
}
