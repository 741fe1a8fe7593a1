//! Change-aware decision logging
//!
//! The live-status node is overwritten every cycle. The decision log is
//! append-only, so it only receives a record when something a human would
//! care about changed: the decision label, or the forecast at the precision
//! it is persisted with (3 decimals).
//!
//! Comparing at persisted precision matters: the previous forecast is read
//! back from the store already rounded, so comparing it against the raw
//! model output would log on every cycle.

use crate::constants::policy::FORECAST_PRECISION_DECIMALS;

/// Round to `decimals` places, half away from zero
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Round to the persisted forecast precision
pub fn round_persisted(value: f64) -> f64 {
    round_to(value, FORECAST_PRECISION_DECIMALS)
}

/// Integer key of a forecast at persisted precision
///
/// Comparing integers sidesteps `0.1 + 0.2 != 0.3` style noise that a
/// float equality check on rounded values would still be exposed to.
fn quantize(value: f64) -> i64 {
    let scale = 10f64.powi(FORECAST_PRECISION_DECIMALS as i32);
    (value * scale).round() as i64
}

/// Whether a new decision is worth appending to the decision log
///
/// `previous_forecast` is `None` on the first cycle (or when the stored
/// value is unreadable); that always logs, as does any label change.
pub fn should_log(
    new_decision: &str,
    new_forecast: f64,
    previous_decision: Option<&str>,
    previous_forecast: Option<f64>,
) -> bool {
    if previous_decision != Some(new_decision) {
        return true;
    }
    match previous_forecast {
        Some(previous) => quantize(new_forecast) != quantize(previous),
        None => true,
    }
}
