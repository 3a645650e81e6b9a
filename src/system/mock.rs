//! Mock snapshot provider for testing
//!
//! This provides an in-memory implementation of SnapshotSystem that can be
//! used in unit and integration tests without a ZFS pool.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use super::{snapshot_name, Dataset, Result, SnapshotInfo, SnapshotSystem, SystemError, VolumeInfo};
use crate::core::period::SnapshotMatcher;

#[derive(Debug, Default)]
struct MockState {
    volumes: Vec<String>,
    /// Full snapshot names in listing order
    snapshots: Vec<String>,
    created: Vec<String>,
    deleted: Vec<String>,
    fail_create: HashSet<String>,
    fail_delete: HashSet<String>,
    fail_list_volumes: bool,
    /// Successful `list_snapshots` calls left before every call fails
    list_snapshots_budget: Option<usize>,
}

/// In-memory snapshot provider
///
/// Snapshots are listed in insertion order, which makes tie-breaking in
/// retention tests deterministic. Every successful create and delete is
/// recorded.
///
/// # Example
///
/// ```rust
/// use orbit_snapshot::core::period::SnapshotMatcher;
/// use orbit_snapshot::system::{MockSystem, SnapshotSystem};
///
/// let system = MockSystem::new(SnapshotMatcher::new().unwrap());
/// system.add_volume("tank/data");
/// system.add_snapshot("tank/data@auto_daily_20240101");
/// system.add_snapshot("tank/data@manual-backup");
///
/// assert_eq!(system.list_snapshots("tank/data").unwrap().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockSystem {
    state: Arc<RwLock<MockState>>,
    matcher: SnapshotMatcher,
}

impl MockSystem {
    /// Create an empty provider
    pub fn new(matcher: SnapshotMatcher) -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::default())),
            matcher,
        }
    }

    /// Add a volume
    pub fn add_volume(&self, name: impl Into<String>) {
        self.state.write().unwrap().volumes.push(name.into());
    }

    /// Add a snapshot by full name (`volume@label`)
    pub fn add_snapshot(&self, name: impl Into<String>) {
        self.state.write().unwrap().snapshots.push(name.into());
    }

    /// Make `create_snapshot` fail for this full snapshot name
    pub fn fail_create(&self, name: impl Into<String>) {
        self.state.write().unwrap().fail_create.insert(name.into());
    }

    /// Make `delete_snapshot` fail for this full snapshot name
    pub fn fail_delete(&self, name: impl Into<String>) {
        self.state.write().unwrap().fail_delete.insert(name.into());
    }

    /// Make `list_volumes` fail
    pub fn fail_list_volumes(&self) {
        self.state.write().unwrap().fail_list_volumes = true;
    }

    /// Make `list_snapshots` fail
    pub fn fail_list_snapshots(&self) {
        self.fail_list_snapshots_after(0);
    }

    /// Let `calls` more `list_snapshots` calls succeed, then fail
    pub fn fail_list_snapshots_after(&self, calls: usize) {
        self.state.write().unwrap().list_snapshots_budget = Some(calls);
    }

    /// Every snapshot currently present, managed or not
    pub fn snapshot_names(&self) -> Vec<String> {
        self.state.read().unwrap().snapshots.clone()
    }

    /// Snapshots created through `create_snapshot`, in call order
    pub fn created(&self) -> Vec<String> {
        self.state.read().unwrap().created.clone()
    }

    /// Snapshots destroyed through `delete_snapshot`, in call order
    pub fn deleted(&self) -> Vec<String> {
        self.state.read().unwrap().deleted.clone()
    }
}

fn command_failed(operation: &str, target: &str, output: &str) -> SystemError {
    SystemError::CommandFailed {
        operation: operation.to_string(),
        target: target.to_string(),
        output: output.to_string(),
    }
}

impl SnapshotSystem for MockSystem {
    fn list_volumes(&self) -> Result<Vec<VolumeInfo>> {
        let state = self.state.read().unwrap();
        if state.fail_list_volumes {
            return Err(command_failed("list", "filesystem", "injected failure"));
        }
        Ok(state.volumes.iter().map(Dataset::named).collect())
    }

    fn list_snapshots(&self, volume: &str) -> Result<Vec<SnapshotInfo>> {
        let mut state = self.state.write().unwrap();
        if let Some(left) = state.list_snapshots_budget.as_mut() {
            if *left == 0 {
                return Err(command_failed("list", "snapshot", "injected failure"));
            }
            *left -= 1;
        }
        let prefix = format!("{}@", volume);
        Ok(state
            .snapshots
            .iter()
            .filter(|name| name.starts_with(&prefix) && self.matcher.is_managed(name))
            .map(Dataset::named)
            .collect())
    }

    fn create_snapshot(&self, volume: &str, label: &str) -> Result<()> {
        let name = snapshot_name(volume, label);
        let mut state = self.state.write().unwrap();

        if !state.volumes.iter().any(|v| v == volume) {
            return Err(SystemError::VolumeNotFound(volume.to_string()));
        }
        if state.snapshots.contains(&name) {
            return Err(SystemError::AlreadyExists(name));
        }
        if state.fail_create.contains(&name) {
            return Err(command_failed("snapshot", &name, "injected failure"));
        }

        state.snapshots.push(name.clone());
        state.created.push(name);
        Ok(())
    }

    fn delete_snapshot(&self, volume: &str, label: &str) -> Result<()> {
        let name = snapshot_name(volume, label);
        let mut state = self.state.write().unwrap();

        if state.fail_delete.contains(&name) {
            return Err(command_failed("destroy", &name, "injected failure"));
        }
        let Some(idx) = state.snapshots.iter().position(|s| *s == name) else {
            return Err(command_failed(
                "destroy",
                &name,
                "could not find any snapshots to destroy; check snapshot names.",
            ));
        };

        state.snapshots.remove(idx);
        state.deleted.push(name);
        Ok(())
    }
}
