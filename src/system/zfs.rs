//! `zfs` command-line implementation of SnapshotSystem
//!
//! Every call runs the `zfs` binary synchronously and waits for it to exit.
//! There is no timeout: a hung `zfs` process hangs the run.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, error, info};

use super::{snapshot_name, Dataset, Result, SnapshotInfo, SnapshotSystem, SystemError, VolumeInfo};
use crate::core::period::SnapshotMatcher;

/// Default location of the zfs binary
pub const DEFAULT_ZFS_BINARY: &str = "/usr/sbin/zfs";

const LIST_COLUMNS: &str = "name,creation,used,avail,refer,mountpoint";
const LIST_COLUMN_COUNT: usize = 6;

/// ZFS provider backed by the `zfs` command
#[derive(Debug, Clone)]
pub struct ZfsSystem {
    binary: PathBuf,
    matcher: SnapshotMatcher,
}

impl ZfsSystem {
    /// Create a provider using the default binary location
    pub fn new(matcher: SnapshotMatcher) -> Self {
        Self::with_binary(DEFAULT_ZFS_BINARY, matcher)
    }

    /// Create a provider using a specific zfs binary
    pub fn with_binary(binary: impl Into<PathBuf>, matcher: SnapshotMatcher) -> Self {
        Self {
            binary: binary.into(),
            matcher,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn run(&self, operation: &str, target: &str, args: &[&str]) -> Result<String> {
        debug!(binary = %self.binary.display(), ?args, "Running zfs");

        let output = Command::new(&self.binary).args(args).output().map_err(|e| {
            error!(
                binary = %self.binary.display(),
                "Failed to execute zfs {}: {}",
                operation,
                e
            );
            SystemError::Io(e)
        })?;

        if !output.status.success() {
            let message = flatten_output(&output);
            error!("Error running zfs {} {}: {}", operation, target, message);
            return Err(SystemError::CommandFailed {
                operation: operation.to_string(),
                target: target.to_string(),
                output: message,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn list(&self, kind: &str) -> Result<Vec<Dataset>> {
        let stdout = self.run("list", kind, &["list", "-t", kind, "-H", "-o", LIST_COLUMNS])?;
        Ok(parse_list_output(&stdout))
    }

    fn list_all_snapshots(&self) -> Result<Vec<SnapshotInfo>> {
        self.list("snapshot")
    }
}

impl SnapshotSystem for ZfsSystem {
    fn list_volumes(&self) -> Result<Vec<VolumeInfo>> {
        self.list("filesystem")
    }

    fn list_snapshots(&self, volume: &str) -> Result<Vec<SnapshotInfo>> {
        let prefix = format!("{}@", volume);
        let snapshots = self
            .list_all_snapshots()?
            .into_iter()
            .filter(|s| s.name.starts_with(&prefix) && self.matcher.is_managed(&s.name))
            .collect();
        Ok(snapshots)
    }

    fn create_snapshot(&self, volume: &str, label: &str) -> Result<()> {
        let name = snapshot_name(volume, label);

        if !self.list_volumes()?.iter().any(|v| v.name == volume) {
            return Err(SystemError::VolumeNotFound(volume.to_string()));
        }
        if self.list_all_snapshots()?.iter().any(|s| s.name == name) {
            return Err(SystemError::AlreadyExists(name));
        }

        self.run("snapshot", &name, &["snapshot", &name])?;
        info!("Created snapshot {}", name);
        Ok(())
    }

    fn delete_snapshot(&self, volume: &str, label: &str) -> Result<()> {
        let name = snapshot_name(volume, label);
        self.run("destroy", &name, &["destroy", &name])?;
        info!("Destroyed snapshot {}", name);
        Ok(())
    }
}

/// Parse tab-separated `zfs list -H` output
///
/// Lines without exactly six columns are ignored.
pub fn parse_list_output(output: &str) -> Vec<Dataset> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() != LIST_COLUMN_COUNT {
                return None;
            }
            Some(Dataset {
                name: parts[0].to_string(),
                creation: parts[1].to_string(),
                used: parts[2].to_string(),
                avail: parts[3].to_string(),
                refer: parts[4].to_string(),
                mountpoint: parts[5].to_string(),
            })
        })
        .collect()
}

/// Combined stdout and stderr on one line
fn flatten_output(output: &Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined.replace('\n', " ").trim().to_string()
}
