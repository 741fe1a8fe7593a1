//! Irrigation Policy Constants
//!
//! Default set points for the dynamic threshold table and the two fixed
//! safety rules (critical soil floor, anomaly margin).

// ===== DYNAMIC THRESHOLD TABLE =====

/// Forecast soil moisture trigger when atmospheric demand is low (fraction).
pub const DEFAULT_THR_LO: f64 = 0.65;

/// Forecast soil moisture trigger for moderate atmospheric demand (fraction).
pub const DEFAULT_THR_MID: f64 = 0.70;

/// Forecast soil moisture trigger when atmospheric demand is high (fraction).
pub const DEFAULT_THR_HI: f64 = 0.72;

/// Safety margin subtracted from the selected threshold (fraction).
///
/// Keeps the controller from toggling when the forecast sits right on the
/// trigger point.
pub const DEFAULT_MARGIN: f64 = 0.005;

/// Lower VPD band edge (kPa). Below this the air is humid and demand is low.
pub const DEFAULT_VPD_LOW_KPA: f64 = 0.75;

/// Upper VPD band edge (kPa). At or above this plants transpire hard.
pub const DEFAULT_VPD_HIGH_KPA: f64 = 1.1;

// ===== SAFETY RULES =====

/// Current soil moisture below which irrigation is forced (fraction).
///
/// Evaluated after the forecast comparison and always wins.
pub const CRITICAL_SOIL_FRAC: f64 = 0.50;

/// Allowed gap between measured and forecast soil moisture before the
/// health evaluator raises an alert (fraction, i.e. 10 percentage points).
///
/// Independent of [`DEFAULT_MARGIN`]; the two are tuned separately.
pub const ANOMALY_MARGIN_FRAC: f64 = 0.10;

// ===== PERSISTENCE PRECISION =====

/// Decimal places kept when forecasts and thresholds are persisted.
///
/// Change detection compares at this precision so float noise below it
/// never produces a new decision log record.
pub const FORECAST_PRECISION_DECIMALS: u32 = 3;
