/*!
 * Period naming for snapshot tiers
 *
 * Maps a calendar date and a tier to the canonical snapshot label, and
 * decides which snapshot names are managed by the rotation at all.
 */

use std::fmt;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, SnapshotError};

/// Prefix shared by every label this tool creates
pub const LABEL_PREFIX: &str = "auto_";

/// Full-name pattern a snapshot must match to be counted, created or destroyed
pub const SNAPSHOT_NAME_PATTERN: &str = r"@auto_(daily|weekly|monthly)_([0-9]+)$";

/// Retention cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Daily,
    Weekly,
    Monthly,
}

impl Tier {
    /// Processing order within a volume. Creation and eviction both follow it.
    pub const ALL: [Tier; 3] = [Tier::Daily, Tier::Weekly, Tier::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Daily => "daily",
            Tier::Weekly => "weekly",
            Tier::Monthly => "monthly",
        }
    }

    fn from_label_segment(segment: &str) -> Option<Tier> {
        match segment {
            "daily" => Some(Tier::Daily),
            "weekly" => Some(Tier::Weekly),
            "monthly" => Some(Tier::Monthly),
            _ => None,
        }
    }

    /// Period key for `date` at this tier's granularity
    ///
    /// - daily: `YYYYMMDD`
    /// - weekly: `YYYY` followed by the ISO week number (see [`WeekFormat`])
    /// - monthly: `YYYYMM`
    ///
    /// `Compat` pairs the calendar year of `date` with the ISO week, so
    /// 2024-12-30 (ISO week 1 of 2025) yields `20241`. `Padded` uses the ISO
    /// week-based year and yields `202501`.
    pub fn period_key(&self, date: NaiveDate, week_format: WeekFormat) -> String {
        match self {
            Tier::Daily => date.format("%Y%m%d").to_string(),
            Tier::Weekly => {
                let iso = date.iso_week();
                match week_format {
                    WeekFormat::Compat => format!("{}{}", date.year(), iso.week()),
                    WeekFormat::Padded => format!("{}{:02}", iso.year(), iso.week()),
                }
            }
            Tier::Monthly => date.format("%Y%m").to_string(),
        }
    }

    /// Canonical label `auto_<tier>_<periodKey>`
    pub fn canonical_label(&self, date: NaiveDate, week_format: WeekFormat) -> String {
        format!(
            "{}{}_{}",
            LABEL_PREFIX,
            self.as_str(),
            self.period_key(date, week_format)
        )
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding of the ISO week number in weekly labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekFormat {
    /// Unpadded week (`20243`), compatible with existing snapshot sets
    #[default]
    Compat,

    /// ISO week-based year and two-digit week (`202403`), keys rise with time
    Padded,
}

/// The canonical labels of all tiers for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodLabels {
    pub daily: String,
    pub weekly: String,
    pub monthly: String,
}

impl PeriodLabels {
    pub fn for_date(date: NaiveDate, week_format: WeekFormat) -> Self {
        Self {
            daily: Tier::Daily.canonical_label(date, week_format),
            weekly: Tier::Weekly.canonical_label(date, week_format),
            monthly: Tier::Monthly.canonical_label(date, week_format),
        }
    }

    pub fn get(&self, tier: Tier) -> &str {
        match tier {
            Tier::Daily => &self.daily,
            Tier::Weekly => &self.weekly,
            Tier::Monthly => &self.monthly,
        }
    }
}

/// Predicate over full snapshot names (`volume@label`)
///
/// Built once at startup and passed by reference to the provider and the
/// rotation core. Names that don't match are invisible to the rotation.
#[derive(Debug, Clone)]
pub struct SnapshotMatcher {
    pattern: Regex,
}

impl SnapshotMatcher {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(SNAPSHOT_NAME_PATTERN).map_err(|e| {
            SnapshotError::Config(format!("Invalid snapshot name pattern: {}", e))
        })?;
        Ok(Self { pattern })
    }

    /// Whether `name` is a snapshot managed by the rotation
    pub fn is_managed(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// Tier a managed snapshot belongs to
    pub fn tier_of(&self, name: &str) -> Option<Tier> {
        let caps = self.pattern.captures(name)?;
        Tier::from_label_segment(caps.get(1)?.as_str())
    }

    pub fn belongs_to(&self, name: &str, tier: Tier) -> bool {
        self.tier_of(name) == Some(tier)
    }
}

/// Parse the trailing period key of a label or full snapshot name
///
/// Returns `None` when the segment after the last `_` is not a non-negative
/// integer that fits in a `u64`; such snapshots are never eviction candidates.
pub fn parse_period_key(label: &str) -> Option<u64> {
    let segment = label.rsplit('_').next()?;
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_label() {
        assert_eq!(
            Tier::Daily.canonical_label(date(2024, 1, 3), WeekFormat::Compat),
            "auto_daily_20240103"
        );
    }

    #[test]
    fn test_weekly_label_unpadded() {
        // 2024-01-17 is in ISO week 3
        assert_eq!(
            Tier::Weekly.canonical_label(date(2024, 1, 17), WeekFormat::Compat),
            "auto_weekly_20243"
        );
        assert_eq!(
            Tier::Weekly.canonical_label(date(2024, 3, 6), WeekFormat::Compat),
            "auto_weekly_202410"
        );
    }

    #[test]
    fn test_weekly_label_padded() {
        assert_eq!(
            Tier::Weekly.canonical_label(date(2024, 1, 17), WeekFormat::Padded),
            "auto_weekly_202403"
        );
        assert_eq!(
            Tier::Weekly.canonical_label(date(2024, 3, 6), WeekFormat::Padded),
            "auto_weekly_202410"
        );
    }

    #[test]
    fn test_weekly_uses_calendar_year() {
        // ISO week 1 of 2025 starts on Monday 2024-12-30
        assert_eq!(Tier::Weekly.period_key(date(2024, 12, 30), WeekFormat::Compat), "20241");
        // ISO week 53 of 2020 runs into January 2021
        assert_eq!(Tier::Weekly.period_key(date(2021, 1, 1), WeekFormat::Compat), "202153");
    }

    #[test]
    fn test_padded_weeks_use_iso_year() {
        assert_eq!(Tier::Weekly.period_key(date(2024, 12, 30), WeekFormat::Padded), "202501");
        assert_eq!(Tier::Weekly.period_key(date(2021, 1, 1), WeekFormat::Padded), "202053");
    }

    #[test]
    fn test_padded_keys_increase_across_new_year() {
        let end = date(2027, 2, 1);
        let mut day = date(2020, 12, 1);
        let mut last = 0;
        while day < end {
            let key = Tier::Weekly.period_key(day, WeekFormat::Padded);
            let key = parse_period_key(&key).unwrap();
            assert!(key >= last, "weekly key went backwards on {}", day);
            last = key;
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_monthly_label() {
        assert_eq!(
            Tier::Monthly.canonical_label(date(2024, 11, 30), WeekFormat::Compat),
            "auto_monthly_202411"
        );
    }

    #[test]
    fn test_period_labels_for_date() {
        let labels = PeriodLabels::for_date(date(2024, 1, 3), WeekFormat::Compat);
        assert_eq!(labels.get(Tier::Daily), "auto_daily_20240103");
        assert_eq!(labels.get(Tier::Weekly), "auto_weekly_20241");
        assert_eq!(labels.get(Tier::Monthly), "auto_monthly_202401");
    }

    #[test]
    fn test_matcher_accepts_managed_names() {
        let matcher = SnapshotMatcher::new().unwrap();
        assert!(matcher.is_managed("tank/data@auto_daily_20240101"));
        assert!(matcher.is_managed("tank@auto_weekly_20243"));
        assert!(matcher.is_managed("tank@auto_monthly_202401"));
    }

    #[test]
    fn test_matcher_rejects_foreign_names() {
        let matcher = SnapshotMatcher::new().unwrap();
        assert!(!matcher.is_managed("tank/data@manual-backup"));
        assert!(!matcher.is_managed("tank/data@auto_daily_"));
        assert!(!matcher.is_managed("tank/data@auto_daily_2024-01-01"));
        assert!(!matcher.is_managed("tank/data@auto_hourly_2024010112"));
        assert!(!matcher.is_managed("tank/data@auto_daily_20240101.bak"));
        assert!(!matcher.is_managed("auto_daily_20240101"));
    }

    #[test]
    fn test_tier_of_uses_label_not_volume() {
        let matcher = SnapshotMatcher::new().unwrap();
        assert_eq!(
            matcher.tier_of("pool/my_daily_set@auto_weekly_20243"),
            Some(Tier::Weekly)
        );
        assert!(!matcher.belongs_to("pool/my_daily_set@auto_weekly_20243", Tier::Daily));
        assert_eq!(matcher.tier_of("pool@manual"), None);
    }

    #[test]
    fn test_parse_period_key() {
        assert_eq!(parse_period_key("auto_daily_20240101"), Some(20240101));
        assert_eq!(parse_period_key("tank@auto_weekly_20243"), Some(20243));
        assert_eq!(parse_period_key("auto_daily_"), None);
        assert_eq!(parse_period_key("auto_daily_abc"), None);
        assert_eq!(parse_period_key("auto_daily_-5"), None);
        // Overflows u64
        assert_eq!(parse_period_key("auto_daily_99999999999999999999999"), None);
    }

    #[test]
    fn test_tier_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            tier: Tier,
            format: WeekFormat,
        }
        let w: Wrapper = toml::from_str("tier = \"weekly\"\nformat = \"padded\"").unwrap();
        assert_eq!(w.tier, Tier::Weekly);
        assert_eq!(w.format, WeekFormat::Padded);
    }
}
