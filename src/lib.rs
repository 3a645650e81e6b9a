/*!
 * orbit-snapshot - tiered ZFS snapshot rotation
 *
 * Keeps a rolling set of daily, weekly and monthly snapshots per volume:
 * - Creates the current period's snapshot for every enabled tier
 * - Evicts the oldest snapshots of each tier beyond its retention count
 * - Ignores snapshots it did not name (`volume@auto_<tier>_<period>` only)
 * - Dry-run mode that plans without touching the pool
 *
 * Author: Shane Wall <shaneawall@gmail.com>
 */

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod system;

// Re-export commonly used types
pub use config::{ErrorMode, LogLevel, SnapshotConfig, VolumePolicy};
pub use crate::core::{RunSummary, Runner, SnapshotMatcher, Tier, WeekFormat};
pub use error::{Result, SnapshotError};
pub use system::{DryRunSystem, MockSystem, SnapshotSystem, ZfsSystem};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
