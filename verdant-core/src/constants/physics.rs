//! Psychrometric Constants for Verdant
//!
//! Coefficients of the Tetens/Magnus form of the saturation vapor pressure
//! curve, as used by FAO-56 for crop evapotranspiration.

/// Saturation vapor pressure of water at 0°C (kPa).
///
/// Scales the exponential term of the Tetens equation:
/// `svp = 0.6108 * exp(17.27 * T / (T + 237.3))`.
///
/// Source: FAO Irrigation and Drainage Paper 56, Eq. 11
pub const SVP_AT_ZERO_C_KPA: f64 = 0.6108;

/// Dimensionless Magnus coefficient over liquid water.
///
/// Source: FAO Irrigation and Drainage Paper 56, Eq. 11
pub const MAGNUS_A: f64 = 17.27;

/// Magnus temperature offset (°C).
///
/// The denominator `T + 237.3` reaches zero at -237.3°C, far below anything
/// a greenhouse sensor reports; readings that close to it yield a non-finite
/// pressure which the VPD calculator maps to zero.
///
/// Source: FAO Irrigation and Drainage Paper 56, Eq. 11
pub const MAGNUS_B_C: f64 = 237.3;
