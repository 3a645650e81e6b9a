/*!
 * Tier reconciliation: create the current period's snapshot when missing
 */

use tracing::{debug, info};

use super::period::Tier;
use crate::error::Result;
use crate::system::{snapshot_name, SnapshotInfo, SnapshotSystem};

/// What reconciliation did for one (volume, tier) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The canonical snapshot was created
    Created,
    /// The canonical snapshot already existed
    AlreadyPresent,
    /// Retention count is 0, nothing is created for this tier
    Disabled,
}

/// Ensure `volume@label` exists if the tier is enabled
///
/// `snapshots` is the volume's managed listing taken before any tier of this
/// run was reconciled. Issues at most one create call.
pub fn reconcile_tier<S: SnapshotSystem + ?Sized>(
    system: &S,
    volume: &str,
    tier: Tier,
    retention: u32,
    label: &str,
    snapshots: &[SnapshotInfo],
) -> Result<ReconcileOutcome> {
    let name = snapshot_name(volume, label);

    if retention == 0 {
        debug!(volume, %tier, "Tier disabled, not creating {}", name);
        return Ok(ReconcileOutcome::Disabled);
    }

    if snapshots.iter().any(|s| s.name == name) {
        debug!(volume, %tier, "Snapshot {} already exists", name);
        return Ok(ReconcileOutcome::AlreadyPresent);
    }

    system.create_snapshot(volume, label)?;
    info!(volume, %tier, snapshot = %name, "Created {} snapshot", tier);
    Ok(ReconcileOutcome::Created)
}
