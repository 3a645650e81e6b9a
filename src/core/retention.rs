/*!
 * Retention enforcement: evict the oldest snapshots of a tier
 *
 * Only snapshots whose period key parses are ever destroyed. Unparseable
 * ones still count toward the tier total, so a tier can stay above its
 * maximum when nothing left can be ordered.
 */

use tracing::{debug, info};

use super::period::{parse_period_key, SnapshotMatcher, Tier};
use crate::error::Result;
use crate::system::{SnapshotInfo, SnapshotSystem};

/// Result of one enforcement pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionOutcome {
    /// Destroyed snapshots, oldest first
    pub deleted: Vec<String>,

    /// Tier snapshots left after the pass
    pub remaining: usize,

    /// Tier snapshots whose period key could not be parsed
    pub unparseable: usize,
}

/// Destroy the oldest `tier` snapshots of `volume` until at most `max` remain
///
/// Ties on the period key go to the snapshot listed first. A failed destroy
/// aborts the pass; snapshots destroyed before it stay destroyed.
pub fn enforce_retention<S: SnapshotSystem + ?Sized>(
    system: &S,
    matcher: &SnapshotMatcher,
    volume: &str,
    tier: Tier,
    max: u32,
    snapshots: &[SnapshotInfo],
) -> Result<RetentionOutcome> {
    let max = max as usize;
    let mut candidates: Vec<&SnapshotInfo> = snapshots
        .iter()
        .filter(|s| matcher.belongs_to(&s.name, tier))
        .collect();
    let mut count = candidates.len();

    let mut outcome = RetentionOutcome {
        unparseable: candidates
            .iter()
            .filter(|s| parse_period_key(&s.name).is_none())
            .count(),
        ..Default::default()
    };

    while count > max {
        let oldest = candidates
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| parse_period_key(&s.name).map(|key| (idx, key)))
            .min_by_key(|&(_, key)| key);

        let Some((idx, key)) = oldest else {
            debug!(
                volume,
                %tier,
                count,
                max,
                "No orderable snapshot left, stopping eviction"
            );
            break;
        };

        let snapshot = candidates.remove(idx);
        let Some(label) = snapshot.label() else {
            continue;
        };

        debug!(volume, %tier, period = key, "Evicting {}", snapshot.name);
        system.delete_snapshot(volume, label)?;
        info!(volume, %tier, snapshot = %snapshot.name, "Destroyed {} snapshot", tier);

        count -= 1;
        outcome.deleted.push(snapshot.name.clone());
    }

    outcome.remaining = count;
    Ok(outcome)
}
