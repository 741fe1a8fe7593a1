//! Constants for Verdant Core
//!
//! Every numeric value the decision cycle depends on lives here, grouped by
//! domain, so that a tuning change never has to hunt through policy code.
//!
//! ## Organization
//!
//! - **Physics**: psychrometric coefficients for saturation vapor pressure
//! - **Policy**: irrigation and health-check set points
//! - **Time**: freshness windows, history sizes and timestamp formats
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Include units in the name (`_KPA`, `_FRAC`, `_SECS`)
//! 3. Keep the anomaly margin and the decision margin separate - they
//!    measure different things

/// Psychrometric constants for vapor pressure calculations.
pub mod physics;

/// Irrigation policy defaults and health-check margins.
pub mod policy;

/// Freshness windows, history sizes and timestamp formats.
pub mod time;

pub use physics::{MAGNUS_A, MAGNUS_B_C, SVP_AT_ZERO_C_KPA};

pub use policy::{
    ANOMALY_MARGIN_FRAC, CRITICAL_SOIL_FRAC, DEFAULT_MARGIN, DEFAULT_THR_HI, DEFAULT_THR_LO,
    DEFAULT_THR_MID, DEFAULT_VPD_HIGH_KPA, DEFAULT_VPD_LOW_KPA, FORECAST_PRECISION_DECIMALS,
};

pub use time::{
    DEFAULT_HISTORY_WINDOW, FRESHNESS_WINDOW_SECS, MIN_HISTORY_LEN, STALE_AGE_SENTINEL_SECS,
};
