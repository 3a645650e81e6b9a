//! Dry-run provider
//!
//! Wraps another SnapshotSystem, passing reads through and recording
//! create/destroy calls instead of executing them. Planned operations are
//! reflected in later listings of the same run so retention decisions match
//! what a real run would do.

use std::fmt;
use std::sync::Mutex;

use tracing::info;

use super::{snapshot_name, Dataset, Result, SnapshotInfo, SnapshotSystem, SystemError, VolumeInfo};

/// A create or destroy that a real run would have issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedOperation {
    Create { snapshot: String },
    Destroy { snapshot: String },
}

impl fmt::Display for PlannedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedOperation::Create { snapshot } => write!(f, "create {}", snapshot),
            PlannedOperation::Destroy { snapshot } => write!(f, "destroy {}", snapshot),
        }
    }
}

/// Provider that simulates mutations on top of a real listing
#[derive(Debug)]
pub struct DryRunSystem<S> {
    inner: S,
    operations: Mutex<Vec<PlannedOperation>>,
}

impl<S: SnapshotSystem> DryRunSystem<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            operations: Mutex::new(Vec::new()),
        }
    }

    /// Operations recorded so far, in call order
    pub fn operations(&self) -> Vec<PlannedOperation> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PlannedOperation>> {
        // A poisoned log is still a valid log
        self.operations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, op: PlannedOperation) {
        info!(target: "dry_run", "[DRY-RUN] Would {}", op);
        self.lock().push(op);
    }
}

impl<S: SnapshotSystem> SnapshotSystem for DryRunSystem<S> {
    fn list_volumes(&self) -> Result<Vec<VolumeInfo>> {
        self.inner.list_volumes()
    }

    fn list_snapshots(&self, volume: &str) -> Result<Vec<SnapshotInfo>> {
        let mut snapshots = self.inner.list_snapshots(volume)?;
        let prefix = format!("{}@", volume);

        for op in self.lock().iter() {
            match op {
                PlannedOperation::Create { snapshot } if snapshot.starts_with(&prefix) => {
                    snapshots.push(Dataset::named(snapshot.as_str()));
                }
                PlannedOperation::Destroy { snapshot } => {
                    snapshots.retain(|s| &s.name != snapshot);
                }
                PlannedOperation::Create { .. } => {}
            }
        }

        Ok(snapshots)
    }

    fn create_snapshot(&self, volume: &str, label: &str) -> Result<()> {
        let name = snapshot_name(volume, label);

        if !self.inner.list_volumes()?.iter().any(|v| v.name == volume) {
            return Err(SystemError::VolumeNotFound(volume.to_string()));
        }
        if self.list_snapshots(volume)?.iter().any(|s| s.name == name) {
            return Err(SystemError::AlreadyExists(name));
        }

        self.record(PlannedOperation::Create { snapshot: name });
        Ok(())
    }

    fn delete_snapshot(&self, volume: &str, label: &str) -> Result<()> {
        self.record(PlannedOperation::Destroy {
            snapshot: snapshot_name(volume, label),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::period::SnapshotMatcher;
    use crate::system::MockSystem;

    fn mock() -> MockSystem {
        let system = MockSystem::new(SnapshotMatcher::new().unwrap());
        system.add_volume("tank/data");
        system.add_snapshot("tank/data@auto_daily_20240101");
        system
    }

    #[test]
    fn test_mutations_are_recorded_not_applied() {
        let mock = mock();
        let dry = DryRunSystem::new(&mock);

        dry.create_snapshot("tank/data", "auto_daily_20240102").unwrap();
        dry.delete_snapshot("tank/data", "auto_daily_20240101").unwrap();

        assert_eq!(
            dry.operations(),
            vec![
                PlannedOperation::Create {
                    snapshot: "tank/data@auto_daily_20240102".to_string()
                },
                PlannedOperation::Destroy {
                    snapshot: "tank/data@auto_daily_20240101".to_string()
                },
            ]
        );
        assert!(mock.created().is_empty());
        assert!(mock.deleted().is_empty());
        assert_eq!(mock.snapshot_names(), vec!["tank/data@auto_daily_20240101"]);
    }

    #[test]
    fn test_listing_reflects_planned_operations() {
        let mock = mock();
        let dry = DryRunSystem::new(&mock);

        dry.create_snapshot("tank/data", "auto_daily_20240102").unwrap();
        dry.delete_snapshot("tank/data", "auto_daily_20240101").unwrap();

        let names: Vec<_> = dry
            .list_snapshots("tank/data")
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["tank/data@auto_daily_20240102"]);
    }

    #[test]
    fn test_create_still_checks_volume_and_duplicates() {
        let mock = mock();
        let dry = DryRunSystem::new(&mock);

        assert!(matches!(
            dry.create_snapshot("tank/missing", "auto_daily_20240102"),
            Err(SystemError::VolumeNotFound(_))
        ));
        assert!(matches!(
            dry.create_snapshot("tank/data", "auto_daily_20240101"),
            Err(SystemError::AlreadyExists(_))
        ));
        assert!(dry.operations().is_empty());
    }

    #[test]
    fn test_display() {
        let op = PlannedOperation::Destroy {
            snapshot: "tank@auto_monthly_202401".to_string(),
        };
        assert_eq!(op.to_string(), "destroy tank@auto_monthly_202401");
    }
}
