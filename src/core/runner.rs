/*!
 * Run orchestration across configured volumes
 *
 * For each volume: confirm it exists, reconcile daily, weekly and monthly
 * against one listing, then enforce retention for daily, weekly and monthly,
 * re-listing before each tier so just-created snapshots are counted. The
 * first error stops that volume.
 */

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{error, info, info_span, warn};

use super::period::{PeriodLabels, SnapshotMatcher, Tier, WeekFormat};
use super::reconcile::{reconcile_tier, ReconcileOutcome};
use super::retention::enforce_retention;
use crate::config::{ErrorMode, SnapshotConfig, VolumePolicy};
use crate::error::{Result, SnapshotError};
use crate::system::{snapshot_name, SnapshotInfo, SnapshotSystem};

/// What happened to one volume
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeReport {
    pub volume: String,
    pub created: Vec<String>,
    pub deleted: Vec<String>,
    /// Managed snapshots left in place because their period key didn't parse
    pub unparseable: usize,
}

/// Outcome of a full run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Volumes processed successfully, in order
    pub volumes: Vec<VolumeReport>,
    /// Volume failures, only populated in continue mode
    pub failures: Vec<SnapshotError>,
    pub duration: Duration,
}

impl RunSummary {
    pub fn created_count(&self) -> usize {
        self.volumes.iter().map(|v| v.created.len()).sum()
    }

    pub fn deleted_count(&self) -> usize {
        self.volumes.iter().map(|v| v.deleted.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives reconciliation and retention over a SnapshotSystem
#[derive(Debug)]
pub struct Runner<S> {
    system: S,
    matcher: SnapshotMatcher,
    week_format: WeekFormat,
    error_mode: ErrorMode,
}

impl<S: SnapshotSystem> Runner<S> {
    pub fn new(system: S, matcher: SnapshotMatcher) -> Self {
        Self {
            system,
            matcher,
            week_format: WeekFormat::default(),
            error_mode: ErrorMode::default(),
        }
    }

    /// Runner with week format and error mode taken from `config`
    pub fn from_config(system: S, matcher: SnapshotMatcher, config: &SnapshotConfig) -> Self {
        Self::new(system, matcher)
            .with_week_format(config.week_format)
            .with_error_mode(config.error_mode)
    }

    pub fn with_week_format(mut self, week_format: WeekFormat) -> Self {
        self.week_format = week_format;
        self
    }

    pub fn with_error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.error_mode = error_mode;
        self
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    /// Process every policy in order
    ///
    /// In abort mode the first volume failure is returned as the error. In
    /// continue mode failures are collected in the summary.
    pub fn run(&self, policies: &[VolumePolicy], today: NaiveDate) -> Result<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        for policy in policies {
            match self.run_volume(policy, today) {
                Ok(report) => summary.volumes.push(report),
                Err(e) => {
                    error!(
                        volume = %policy.name,
                        category = %e.category(),
                        "Error processing snapshots: {}",
                        e
                    );
                    match self.error_mode {
                        ErrorMode::Abort => return Err(e),
                        ErrorMode::Continue => summary.failures.push(e),
                    }
                }
            }
        }

        summary.duration = start.elapsed();
        info!(
            volumes = summary.volumes.len(),
            failed = summary.failures.len(),
            created = summary.created_count(),
            deleted = summary.deleted_count(),
            "Snapshot rotation finished in {:?}",
            summary.duration
        );
        Ok(summary)
    }

    /// Reconcile and enforce all tiers of one volume
    pub fn run_volume(&self, policy: &VolumePolicy, today: NaiveDate) -> Result<VolumeReport> {
        let volume = policy.name.as_str();
        let span = info_span!("volume", volume);
        let _enter = span.enter();

        let mut report = VolumeReport {
            volume: volume.to_string(),
            ..Default::default()
        };

        let volumes = self
            .system
            .list_volumes()
            .map_err(|e| SnapshotError::from(e).in_volume(volume, "list volumes"))?;
        if !volumes.iter().any(|v| v.name == volume) {
            return Err(SnapshotError::NotFound {
                volume: volume.to_string(),
            }
            .in_volume(volume, "lookup volume"));
        }

        let labels = PeriodLabels::for_date(today, self.week_format);
        let snapshots = self.list_snapshots(volume, "list snapshots")?;

        for tier in Tier::ALL {
            let label = labels.get(tier);
            let outcome = reconcile_tier(
                &self.system,
                volume,
                tier,
                policy.retention(tier),
                label,
                &snapshots,
            )
            .map_err(|e| e.in_volume(volume, format!("create {}", tier)))?;

            if outcome == ReconcileOutcome::Created {
                report.created.push(snapshot_name(volume, label));
            }
        }

        for tier in Tier::ALL {
            let step = format!("cleanup {}", tier);
            let snapshots = self.list_snapshots(volume, &step)?;
            let outcome = enforce_retention(
                &self.system,
                &self.matcher,
                volume,
                tier,
                policy.retention(tier),
                &snapshots,
            )
            .map_err(|e| e.in_volume(volume, step.as_str()))?;

            if outcome.remaining > policy.retention(tier) as usize {
                warn!(
                    %tier,
                    remaining = outcome.remaining,
                    max = policy.retention(tier),
                    "Tier still above retention, {} snapshot(s) have unparseable period keys",
                    outcome.unparseable
                );
            }
            report.deleted.extend(outcome.deleted);
            report.unparseable += outcome.unparseable;
        }

        Ok(report)
    }

    fn list_snapshots(&self, volume: &str, step: &str) -> Result<Vec<SnapshotInfo>> {
        self.system
            .list_snapshots(volume)
            .map_err(|e| SnapshotError::from(e).in_volume(volume, step))
    }
}
