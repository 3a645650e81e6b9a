/*!
 * Core snapshot rotation
 *
 * - `period`: canonical labels and the managed-snapshot predicate
 * - `reconcile`: create the current period's snapshot per tier
 * - `retention`: evict the oldest snapshots beyond a tier's maximum
 * - `runner`: apply both across configured volumes
 */

pub mod period;
pub mod reconcile;
pub mod retention;
pub mod runner;

pub use period::{parse_period_key, PeriodLabels, SnapshotMatcher, Tier, WeekFormat};
pub use reconcile::{reconcile_tier, ReconcileOutcome};
pub use retention::{enforce_retention, RetentionOutcome};
pub use runner::{RunSummary, Runner, VolumeReport};
