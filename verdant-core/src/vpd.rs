//! Vapor Pressure Deficit
//!
//! ## Physics Background
//!
//! Warm air can hold more water vapor than cold air; the ceiling is the
//! saturation vapor pressure (SVP), which rises roughly exponentially with
//! temperature:
//!
//! ```text
//! svp(T) = 0.6108 · exp(17.27·T / (T + 237.3))      [kPa, T in °C]
//! ```
//!
//! Relative humidity says how close the air is to that ceiling. The deficit
//! is what is left over:
//!
//! ```text
//! vpd = svp(T) · (1 − RH/100)
//! ```
//!
//! VPD is the "drying power" of the air. Leaves transpire faster, and soil
//! dries faster, as it rises:
//!
//! | VPD (kPa) | Greenhouse reading          |
//! |-----------|-----------------------------|
//! | < 0.4     | Saturated, disease risk     |
//! | 0.4 - 0.8 | Low demand                  |
//! | 0.8 - 1.2 | Ideal growth band           |
//! | > 1.2     | High demand, stomata close  |
//!
//! ## Edge cases
//!
//! - Missing temperature or humidity gives `0.0`, never an error
//! - RH above 100 (fog, sensor drift) would give a negative deficit; the
//!   result is clamped at zero
//! - Non-finite inputs or results give `0.0`

use crate::constants::physics::{MAGNUS_A, MAGNUS_B_C, SVP_AT_ZERO_C_KPA};

/// Saturation vapor pressure over water (kPa) at `temp_c`
///
/// Non-finite for temperatures at the Magnus pole (-237.3°C).
pub fn saturation_vapor_pressure_kpa(temp_c: f64) -> f64 {
    SVP_AT_ZERO_C_KPA * libm::exp((MAGNUS_A * temp_c) / (temp_c + MAGNUS_B_C))
}

/// Vapor pressure deficit (kPa), clamped to be non-negative
pub fn vpd_kpa(temp_c: Option<f64>, rh_percent: Option<f64>) -> f64 {
    let (Some(t), Some(rh)) = (temp_c, rh_percent) else {
        return 0.0;
    };
    let deficit = saturation_vapor_pressure_kpa(t) * (1.0 - rh / 100.0);
    if deficit.is_finite() {
        deficit.max(0.0)
    } else {
        0.0
    }
}
