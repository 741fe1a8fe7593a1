//! Time management for the decision cycle
//!
//! The field device stamps its uploads with its own wall clock, usually
//! local time without an offset (`2024-05-01 14:03:22`). Everything in the
//! core therefore works in that same wall-clock frame:
//! - [`TimeSource::now`] returns the device-local wall clock
//! - [`RawTimestamp::resolve`] converts whatever the store holds into it
//!
//! Offsets present in a timestamp (RFC 3339) are honored and converted to
//! the device offset, so a cloud-side writer using UTC still lines up.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::time::{EPOCH_MILLIS_CUTOFF, WALL_CLOCK_FORMAT};

/// Wall-clock instant in the device's local frame
pub type Timestamp = NaiveDateTime;

/// Source of "now" for freshness checks and persisted timestamps
pub trait TimeSource: Send + Sync {
    /// Current wall-clock time in the device frame
    fn now(&self) -> Timestamp;

    /// Offset of the device frame from UTC
    fn offset(&self) -> FixedOffset;
}

/// Real clock shifted into the device's fixed offset
#[derive(Debug, Clone, Copy)]
pub struct SystemTime {
    offset: FixedOffset,
}

impl SystemTime {
    /// Clock in UTC
    pub fn utc() -> Self {
        Self { offset: utc_offset() }
    }

    /// Clock shifted by `offset_secs` east of UTC
    ///
    /// Out-of-range offsets (beyond ±24h) fall back to UTC.
    pub fn with_offset_secs(offset_secs: i32) -> Self {
        Self {
            offset: FixedOffset::east_opt(offset_secs).unwrap_or_else(utc_offset),
        }
    }
}

impl Default for SystemTime {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        Utc::now().with_timezone(&self.offset).naive_local()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
    offset: FixedOffset,
}

impl FixedTime {
    /// Clock frozen at `timestamp`, UTC frame
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            offset: utc_offset(),
        }
    }

    /// Use a non-UTC device frame
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Move the clock to `timestamp`
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Move the clock forward
    pub fn advance_secs(&mut self, secs: i64) {
        self.timestamp += chrono::Duration::seconds(secs);
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Timestamp exactly as it was read from the store
///
/// The device firmware and the backend have written both strings and epoch
/// numbers over time, so both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Epoch seconds, or epoch milliseconds for large values
    Epoch(f64),
    /// Textual timestamp
    Text(String),
}

impl RawTimestamp {
    /// Convert to the device wall-clock frame
    ///
    /// Returns `None` when the value cannot be interpreted.
    pub fn resolve(&self, offset: FixedOffset) -> Option<Timestamp> {
        match self {
            Self::Epoch(value) => from_epoch(*value, offset),
            Self::Text(text) => parse_text(text.trim(), offset),
        }
    }
}

impl From<&str> for RawTimestamp {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Timestamp> for RawTimestamp {
    fn from(ts: Timestamp) -> Self {
        Self::Text(format_wall_clock(ts))
    }
}

/// Format a wall-clock instant the way it is persisted (`YYYY-MM-DD HH:MM:SS`)
pub fn format_wall_clock(ts: Timestamp) -> String {
    ts.format(WALL_CLOCK_FORMAT).to_string()
}

fn parse_text(text: &str, offset: FixedOffset) -> Option<Timestamp> {
    if text.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return to_device_frame(with_offset.naive_utc(), offset);
    }

    const NAIVE_FORMATS: [&str; 4] = [
        WALL_CLOCK_FORMAT,
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| text.parse::<f64>().ok().and_then(|v| from_epoch(v, offset)))
}

fn from_epoch(value: f64, offset: FixedOffset) -> Option<Timestamp> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value.abs() > EPOCH_MILLIS_CUTOFF {
        value
    } else {
        value * 1000.0
    };
    DateTime::from_timestamp_millis(millis as i64)
        .and_then(|utc| to_device_frame(utc.naive_utc(), offset))
}

/// `None` when the shifted instant falls outside chrono's range
fn to_device_frame(utc: NaiveDateTime, offset: FixedOffset) -> Option<Timestamp> {
    utc.checked_add_signed(Duration::seconds(i64::from(offset.local_minus_utc())))
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}
