//! Freshness gate for live readings
//!
//! Runs before any decision or health logic. A stale device must never be
//! fed to the predictor: the caller short-circuits to `OFFLINE` instead.
//!
//! ```rust
//! use verdant_core::freshness::check_freshness;
//! use verdant_core::time::{FixedTime, RawTimestamp, TimeSource};
//! # use chrono::NaiveDate;
//! # let now = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(12, 2, 0).unwrap();
//! let clock = FixedTime::new(now);
//!
//! let stamp = RawTimestamp::from("2024-05-01 12:00:30");
//! let freshness = check_freshness(Some(&stamp), &clock);
//! assert!(freshness.is_fresh);
//! assert_eq!(freshness.age_secs, Some(90.0));
//! ```

use crate::constants::time::{FRESHNESS_WINDOW_SECS, STALE_AGE_SENTINEL_SECS};
use crate::reading::LiveStatus;
use crate::time::{RawTimestamp, TimeSource};

/// Outcome of the freshness check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Freshness {
    /// Whether the reading may be trusted
    pub is_fresh: bool,
    /// Seconds since the reading, `None` when there was no timestamp at all
    pub age_secs: Option<f64>,
}

impl Freshness {
    /// No reading, or no timestamp on it
    pub const MISSING: Self = Self {
        is_fresh: false,
        age_secs: None,
    };

    /// Timestamp present but unreadable
    pub const MALFORMED: Self = Self {
        is_fresh: false,
        age_secs: Some(STALE_AGE_SENTINEL_SECS),
    };
}

/// Check a raw timestamp against the clock
///
/// Fresh iff `now - timestamp < 120 s`. Timestamps from the future have a
/// negative age and count as fresh.
pub fn check_freshness(timestamp: Option<&RawTimestamp>, clock: &dyn TimeSource) -> Freshness {
    let Some(raw) = timestamp else {
        return Freshness::MISSING;
    };
    let Some(recorded) = raw.resolve(clock.offset()) else {
        return Freshness::MALFORMED;
    };

    let age = clock.now() - recorded;
    let age_secs = age.num_milliseconds() as f64 / 1000.0;
    Freshness {
        is_fresh: age_secs < FRESHNESS_WINDOW_SECS,
        age_secs: Some(age_secs),
    }
}

/// Check the device's live-status node, if any
pub fn check_live(live: Option<&LiveStatus>, clock: &dyn TimeSource) -> Freshness {
    match live {
        Some(status) => check_freshness(status.timestamp().as_ref(), clock),
        None => Freshness::MISSING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{format_wall_clock, FixedTime, Timestamp};
    use chrono::{Duration, NaiveDate};
    use serde_json::json;

    fn noon() -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    fn stamp_ago(secs: i64) -> RawTimestamp {
        RawTimestamp::from(noon() - Duration::seconds(secs))
    }

    #[test]
    fn boundary_at_120_seconds() {
        let clock = FixedTime::new(noon());

        let fresh = check_freshness(Some(&stamp_ago(119)), &clock);
        assert!(fresh.is_fresh);
        assert_eq!(fresh.age_secs, Some(119.0));

        let stale = check_freshness(Some(&stamp_ago(121)), &clock);
        assert!(!stale.is_fresh);
        assert_eq!(stale.age_secs, Some(121.0));

        assert!(!check_freshness(Some(&stamp_ago(120)), &clock).is_fresh);
    }

    #[test]
    fn missing_timestamp_never_fresh() {
        let clock = FixedTime::new(noon());
        assert_eq!(check_freshness(None, &clock), Freshness::MISSING);
        assert_eq!(check_live(None, &clock), Freshness::MISSING);

        let live = LiveStatus::from_value(json!({ "soilPercent": 60 })).unwrap();
        assert_eq!(check_live(Some(&live), &clock), Freshness::MISSING);
    }

    #[test]
    fn malformed_timestamp_gets_sentinel_age() {
        let clock = FixedTime::new(noon());
        let garbage = RawTimestamp::from("not a time");
        assert_eq!(check_freshness(Some(&garbage), &clock), Freshness::MALFORMED);
    }

    #[test]
    fn out_of_range_epoch_is_malformed() {
        let east = chrono::FixedOffset::east_opt(7 * 3600).unwrap();
        let clock = FixedTime::new(noon()).with_offset(east);
        let live = LiveStatus::from_value(json!({
            "timestamp": chrono::NaiveDateTime::MAX.and_utc().timestamp_millis(),
        }))
        .unwrap();
        assert_eq!(check_live(Some(&live), &clock), Freshness::MALFORMED);
    }

    #[test]
    fn live_status_uses_its_timestamp() {
        let clock = FixedTime::new(noon());
        let live = LiveStatus::from_value(json!({
            "timestamp": format_wall_clock(noon() - Duration::seconds(30)),
        }))
        .unwrap();
        assert!(check_live(Some(&live), &clock).is_fresh);
    }
}
