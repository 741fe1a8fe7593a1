//! Dynamic Threshold Policy
//!
//! The irrigation trigger point moves with atmospheric demand. When the air
//! is dry (high VPD) the soil will lose water faster than the forecast
//! horizon suggests, so irrigation should start earlier, i.e. at a *higher*
//! forecast moisture level.
//!
//! ```text
//!  threshold
//!     ▲
//! hi  │                    ┌──────────
//! mid │          ┌─────────┘
//! lo  │──────────┘
//!     └──────────┼─────────┼──────────▶ VPD (kPa)
//!             vpd_low   vpd_high
//! ```
//!
//! Bands are half-open `[lo, hi)`: a VPD exactly on an edge belongs to the
//! higher band.

use serde::{Deserialize, Serialize};

use crate::constants::policy::{
    DEFAULT_MARGIN, DEFAULT_THR_HI, DEFAULT_THR_LO, DEFAULT_THR_MID, DEFAULT_VPD_HIGH_KPA,
    DEFAULT_VPD_LOW_KPA,
};
use crate::errors::{CoreError, CoreResult};

/// Immutable irrigation policy, loaded once at start-up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Threshold in the low-demand band (fraction)
    pub thr_lo: f64,
    /// Threshold in the moderate band (fraction)
    pub thr_mid: f64,
    /// Threshold in the high-demand band (fraction)
    pub thr_hi: f64,
    /// Safety margin subtracted from the selected threshold (fraction)
    pub margin: f64,
    /// Lower VPD band edge (kPa)
    pub vpd_low: f64,
    /// Upper VPD band edge (kPa)
    pub vpd_high: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            thr_lo: DEFAULT_THR_LO,
            thr_mid: DEFAULT_THR_MID,
            thr_hi: DEFAULT_THR_HI,
            margin: DEFAULT_MARGIN,
            vpd_low: DEFAULT_VPD_LOW_KPA,
            vpd_high: DEFAULT_VPD_HIGH_KPA,
        }
    }
}

impl PolicyConfig {
    /// Replace the three thresholds
    pub fn with_thresholds(mut self, lo: f64, mid: f64, hi: f64) -> Self {
        self.thr_lo = lo;
        self.thr_mid = mid;
        self.thr_hi = hi;
        self
    }

    /// Replace the VPD band edges
    pub fn with_vpd_bands(mut self, low: f64, high: f64) -> Self {
        self.vpd_low = low;
        self.vpd_high = high;
        self
    }

    /// Replace the safety margin
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Check the ordering constraints
    pub fn validate(&self) -> CoreResult<()> {
        let values = [
            self.thr_lo,
            self.thr_mid,
            self.thr_hi,
            self.margin,
            self.vpd_low,
            self.vpd_high,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::InvalidConfig {
                reason: "all policy values must be finite",
            });
        }
        if !(self.thr_lo < self.thr_mid && self.thr_mid < self.thr_hi) {
            return Err(CoreError::InvalidConfig {
                reason: "thresholds must satisfy thr_lo < thr_mid < thr_hi",
            });
        }
        if self.vpd_low >= self.vpd_high {
            return Err(CoreError::InvalidConfig {
                reason: "VPD bands must satisfy vpd_low < vpd_high",
            });
        }
        if self.margin < 0.0 {
            return Err(CoreError::InvalidConfig {
                reason: "margin must not be negative",
            });
        }
        Ok(())
    }

    /// Band the given VPD falls into
    pub fn band(&self, vpd_kpa: f64) -> VpdBand {
        if vpd_kpa < self.vpd_low {
            VpdBand::Low
        } else if vpd_kpa < self.vpd_high {
            VpdBand::Moderate
        } else {
            VpdBand::High
        }
    }
}

/// Atmospheric demand band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VpdBand {
    /// `vpd < vpd_low`
    Low,
    /// `vpd_low <= vpd < vpd_high`
    Moderate,
    /// `vpd >= vpd_high`
    High,
}

/// Irrigation threshold for the current VPD
pub fn dynamic_threshold(vpd_kpa: f64, config: &PolicyConfig) -> f64 {
    match config.band(vpd_kpa) {
        VpdBand::Low => config.thr_lo,
        VpdBand::Moderate => config.thr_mid,
        VpdBand::High => config.thr_hi,
    }
}
