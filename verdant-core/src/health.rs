//! Device Health Evaluator
//!
//! Cross-checks the live soil probe against what the model expected. The
//! model has learned how this zone normally behaves; a large gap between
//! expectation and measurement points at hardware rather than weather.
//!
//! ## Rules
//!
//! | Pump | Condition                         | Verdict       | Likely cause              |
//! |------|-----------------------------------|---------------|---------------------------|
//! | ON   | `current <= forecast - 0.10`      | `PUMP_FAIL`   | dry run, clogged line     |
//! | OFF  | `forecast - current > 0.10`       | `SENSOR_FAIL` | leak, probe drift, heat   |
//! | any  | otherwise                         | `NORMAL`      |                           |
//!
//! The 10-point anomaly margin is fixed and deliberately separate from the
//! decision engine's threshold margin.
//!
//! Only call [`evaluate_health`] after the freshness gate has passed and
//! enough history exists; otherwise report [`HealthVerdict::offline`] or
//! [`HealthVerdict::waiting_for_data`].

use core::fmt;

use serde::{Serialize, Serializer};

use crate::constants::policy::ANOMALY_MARGIN_FRAC;

/// Maximum number of alerts a verdict carries
pub const MAX_ALERTS: usize = 4;

/// Health classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    /// Measurement tracks expectation
    Normal,
    /// Pump running but soil not wetting
    PumpFail,
    /// Soil drying faster than the model can explain
    SensorFail,
    /// Device data stale or missing
    Offline,
    /// Not enough history to form an expectation
    WaitingData,
}

impl HealthStatus {
    /// Status as returned to clients
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::PumpFail => "PUMP_FAIL",
            Self::SensorFail => "SENSOR_FAIL",
            Self::Offline => "OFFLINE",
            Self::WaitingData => "WAITING_DATA",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single alert; serialized as its message
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Alert {
    /// Pump on, soil well below expectation
    PumpOnSoilDry {
        /// Measured soil moisture (%)
        current_pct: f64,
        /// Expected soil moisture (%)
        predicted_pct: f64,
    },
    /// Pump off, soil drying faster than expected
    HighEvaporation {
        /// Measured minus expected (percentage points)
        deviation_pct: f64,
    },
    /// Device not reporting
    SystemOffline,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PumpOnSoilDry {
                current_pct,
                predicted_pct,
            } => write!(
                f,
                "Critical: Pump ON but soil dry ({current_pct:.1}% vs Pred {predicted_pct:.1}%)"
            ),
            Self::HighEvaporation { deviation_pct } => write!(
                f,
                "Warning: High evaporation/Leak detected (Dev: {deviation_pct:.1}%)"
            ),
            Self::SystemOffline => f.write_str("System offline"),
        }
    }
}

impl Serialize for Alert {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of a health check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthVerdict {
    /// Classification
    pub status: HealthStatus,
    /// Zero or more alerts
    pub alerts: heapless::Vec<Alert, MAX_ALERTS>,
    /// `(current - forecast) * 100`, signed percentage points
    pub deviation_percent: f64,
}

impl HealthVerdict {
    fn new(status: HealthStatus, deviation_percent: f64) -> Self {
        Self {
            status,
            alerts: heapless::Vec::new(),
            deviation_percent,
        }
    }

    fn with_alert(mut self, alert: Alert) -> Self {
        // capacity is sized for every rule firing at once
        let pushed = self.alerts.push(alert);
        debug_assert!(pushed.is_ok(), "more than {} health alerts", MAX_ALERTS);
        self
    }

    /// Device stale or missing
    pub fn offline() -> Self {
        Self::new(HealthStatus::Offline, 0.0).with_alert(Alert::SystemOffline)
    }

    /// History too short
    pub fn waiting_for_data() -> Self {
        Self::new(HealthStatus::WaitingData, 0.0)
    }

    /// Whether any alert was raised
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }
}

/// Compare measurement against model expectation
///
/// All soil values are fractions.
pub fn evaluate_health(current_soil_frac: f64, pump_on: bool, forecast_soil_frac: f64) -> HealthVerdict {
    let deviation = (current_soil_frac - forecast_soil_frac) * 100.0;

    if pump_on {
        if current_soil_frac <= forecast_soil_frac - ANOMALY_MARGIN_FRAC {
            return HealthVerdict::new(HealthStatus::PumpFail, deviation).with_alert(
                Alert::PumpOnSoilDry {
                    current_pct: current_soil_frac * 100.0,
                    predicted_pct: forecast_soil_frac * 100.0,
                },
            );
        }
    } else if forecast_soil_frac - current_soil_frac > ANOMALY_MARGIN_FRAC {
        return HealthVerdict::new(HealthStatus::SensorFail, deviation).with_alert(
            Alert::HighEvaporation {
                deviation_pct: deviation,
            },
        );
    }

    HealthVerdict::new(HealthStatus::Normal, deviation)
}
