//! Time-Related Constants
//!
//! Freshness windows and history sizing for the decision cycle.

/// Maximum age of the live reading before the device counts as offline (s).
///
/// The device publishes roughly every 30 s, so 120 s tolerates three missed
/// uploads.
pub const FRESHNESS_WINDOW_SECS: f64 = 120.0;

/// Age reported when a timestamp exists but cannot be parsed (s).
pub const STALE_AGE_SENTINEL_SECS: f64 = 9999.0;

/// Minimum number of history records before any forecast is attempted.
pub const MIN_HISTORY_LEN: usize = 10;

/// Number of most recent history records fetched per decision cycle.
pub const DEFAULT_HISTORY_WINDOW: usize = 60;

/// Wall-clock format used for persisted timestamps.
pub const WALL_CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Epoch values above this are interpreted as milliseconds rather than seconds.
///
/// 1e11 seconds is the year 5138; 1e11 milliseconds is March 1973.
pub const EPOCH_MILLIS_CUTOFF: f64 = 1e11;
