//! Snapshot provider abstraction
//!
//! The rotation core never talks to ZFS directly. It goes through the
//! `SnapshotSystem` trait, which has three implementations:
//! - `ZfsSystem`: shells out to the `zfs` binary
//! - `DryRunSystem`: wraps another system and records create/destroy calls
//!   instead of executing them
//! - `MockSystem`: in-memory implementation for testing

mod dry_run;
pub mod mock;
mod zfs;

pub use dry_run::{DryRunSystem, PlannedOperation};
pub use mock::MockSystem;
pub use zfs::{parse_list_output, ZfsSystem, DEFAULT_ZFS_BINARY};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SystemError {
    #[error("zfs: no filesystem with name {0}")]
    VolumeNotFound(String),

    #[error("zfs: snapshot already exists {0}")]
    AlreadyExists(String),

    #[error("zfs {operation} {target}: {output}")]
    CommandFailed {
        operation: String,
        target: String,
        output: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SystemError>;

/// One row of `zfs list -H -o name,creation,used,avail,refer,mountpoint`
///
/// Volumes and snapshots share the column set. Everything except `name`
/// is carried through verbatim and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dataset {
    pub name: String,
    pub creation: String,
    pub used: String,
    pub avail: String,
    pub refer: String,
    pub mountpoint: String,
}

pub type VolumeInfo = Dataset;
pub type SnapshotInfo = Dataset;

impl Dataset {
    /// Dataset with only a name, other columns empty
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Label part of a snapshot name (everything after `@`)
    pub fn label(&self) -> Option<&str> {
        self.name.split_once('@').map(|(_, label)| label)
    }
}

/// Full snapshot identity `volume@label`
pub fn snapshot_name(volume: &str, label: &str) -> String {
    format!("{}@{}", volume, label)
}

/// Storage capability the rotation core depends on
///
/// All calls are synchronous and may block for as long as the underlying
/// provider takes.
pub trait SnapshotSystem {
    /// List all volumes that can be snapshotted
    fn list_volumes(&self) -> Result<Vec<VolumeInfo>>;

    /// List the managed snapshots of one volume
    ///
    /// Implementations return only snapshots named `volume@...` whose full
    /// name matches the managed-snapshot pattern.
    fn list_snapshots(&self, volume: &str) -> Result<Vec<SnapshotInfo>>;

    /// Create `volume@label`
    ///
    /// Fails with `VolumeNotFound` if the volume is gone and with
    /// `AlreadyExists` if the name is taken.
    fn create_snapshot(&self, volume: &str, label: &str) -> Result<()>;

    /// Destroy `volume@label`
    fn delete_snapshot(&self, volume: &str, label: &str) -> Result<()>;
}

impl<S: SnapshotSystem + ?Sized> SnapshotSystem for &S {
    fn list_volumes(&self) -> Result<Vec<VolumeInfo>> {
        (**self).list_volumes()
    }

    fn list_snapshots(&self, volume: &str) -> Result<Vec<SnapshotInfo>> {
        (**self).list_snapshots(volume)
    }

    fn create_snapshot(&self, volume: &str, label: &str) -> Result<()> {
        (**self).create_snapshot(volume, label)
    }

    fn delete_snapshot(&self, volume: &str, label: &str) -> Result<()> {
        (**self).delete_snapshot(volume, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_split() {
        let snap = Dataset::named("tank/data@auto_daily_20240101");
        assert_eq!(snap.label(), Some("auto_daily_20240101"));

        let vol = Dataset::named("tank/data");
        assert_eq!(vol.label(), None);
    }

    #[test]
    fn test_snapshot_name() {
        assert_eq!(
            snapshot_name("tank/data", "auto_monthly_202401"),
            "tank/data@auto_monthly_202401"
        );
    }

    #[test]
    fn test_error_display() {
        let err = SystemError::CommandFailed {
            operation: "destroy".to_string(),
            target: "tank@auto_daily_1".to_string(),
            output: "dataset is busy".to_string(),
        };
        assert_eq!(err.to_string(), "zfs destroy tank@auto_daily_1: dataset is busy");
        assert_eq!(
            SystemError::AlreadyExists("tank@a".to_string()).to_string(),
            "zfs: snapshot already exists tank@a"
        );
    }
}
