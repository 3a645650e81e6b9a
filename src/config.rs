/*!
 * Configuration types for orbit-snapshot
 */

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::period::{Tier, WeekFormat};
use crate::error::{Result, SnapshotError};
use crate::system::DEFAULT_ZFS_BINARY;

/// Retention policy for one volume
///
/// A count of 0 disables creation for that tier and evicts every existing
/// snapshot of it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumePolicy {
    /// Volume (ZFS dataset) name, e.g. `tank/data`
    pub name: String,

    #[serde(default)]
    pub daily: u32,

    #[serde(default)]
    pub weekly: u32,

    #[serde(default)]
    pub monthly: u32,
}

impl VolumePolicy {
    pub fn new(name: impl Into<String>, daily: u32, weekly: u32, monthly: u32) -> Self {
        Self {
            name: name.into(),
            daily,
            weekly,
            monthly,
        }
    }

    /// Maximum number of snapshots kept for `tier`
    pub fn retention(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Daily => self.daily,
            Tier::Weekly => self.weekly,
            Tier::Monthly => self.monthly,
        }
    }
}

/// Main configuration for a rotation run
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotConfig {
    /// Path to the zfs binary
    #[serde(default = "default_zfs_binary")]
    pub zfs_binary: PathBuf,

    /// What to do when a volume fails
    #[serde(default)]
    pub error_mode: ErrorMode,

    /// Weekly label encoding
    #[serde(default)]
    pub week_format: WeekFormat,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,

    /// Decide everything but create and destroy nothing
    #[serde(default)]
    pub dry_run: bool,

    /// Volumes to rotate, processed in order
    #[serde(default, rename = "volume")]
    pub volumes: Vec<VolumePolicy>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            zfs_binary: default_zfs_binary(),
            error_mode: ErrorMode::default(),
            week_format: WeekFormat::default(),
            log_level: LogLevel::default(),
            log_file: None,
            verbose: false,
            dry_run: false,
            volumes: Vec::new(),
        }
    }
}

/// Error handling mode determines behavior when a volume fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Stop at the first failed volume
    #[default]
    Abort,

    /// Record the failure and move on to the next volume
    Continue,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn default_zfs_binary() -> PathBuf {
    PathBuf::from(DEFAULT_ZFS_BINARY)
}

impl SnapshotConfig {
    /// Load and validate a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SnapshotError::Config(format!("Error reading {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SnapshotConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check volume names: non-empty, no `@`, unique
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for volume in &self.volumes {
            if volume.name.trim().is_empty() {
                return Err(SnapshotError::Config(
                    "Volume name must not be empty".to_string(),
                ));
            }
            if volume.name.contains('@') {
                return Err(SnapshotError::Config(format!(
                    "Volume name {} must not contain '@'",
                    volume.name
                )));
            }
            if !seen.insert(volume.name.as_str()) {
                return Err(SnapshotError::Config(format!(
                    "Volume {} is configured more than once",
                    volume.name
                )));
            }
        }
        Ok(())
    }
}
