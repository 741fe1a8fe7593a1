//! Irrigation Decision Engine
//!
//! Fuses the model forecast, the VPD-driven threshold and the hard safety
//! floor into one GO/WAIT action with a reason a grower can read.
//!
//! ## Algorithm
//!
//! ```text
//! dynamic   = threshold(vpd)               (policy table)
//! effective = dynamic - margin
//!
//! WAIT                                     default
//! IRRIGATE  if forecast < effective        soil is drying out
//! IRRIGATE  if current  < 0.50             emergency, always wins
//! ```
//!
//! The emergency rule is applied last and unconditionally. A forecast that
//! says "moisture will recover" does not outvote a probe reading that says
//! the root zone is critically dry right now.
//!
//! ## Example
//!
//! ```rust
//! use verdant_core::{decide, DecisionLabel, PolicyConfig};
//!
//! let cfg = PolicyConfig::default();
//! // moderate demand (0.9 kPa) → threshold 0.70, effective 0.695
//! let decision = decide(0.60, 0.68, 0.9, &cfg);
//! assert_eq!(decision.label, DecisionLabel::Irrigate);
//! assert_eq!(decision.reason, "Soil Drying Out (Forecast 60% < Limit 69%)");
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::policy::CRITICAL_SOIL_FRAC;
use crate::dedup::round_persisted;
use crate::policy::{dynamic_threshold, PolicyConfig};
use crate::time::{format_wall_clock, Timestamp};

/// Final action of a decision cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionLabel {
    /// Start the pump
    Irrigate,
    /// Do nothing this cycle
    Wait,
    /// Device data is stale or missing
    Offline,
    /// Not enough history for a forecast yet
    WaitData,
}

impl DecisionLabel {
    /// Label as persisted and returned to clients
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Irrigate => "IRRIGATE",
            Self::Wait => "WAIT",
            Self::Offline => "OFFLINE",
            Self::WaitData => "WAIT_DATA",
        }
    }
}

impl fmt::Display for DecisionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule produced the label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Forecast at or above the effective threshold
    ForecastStable,
    /// Forecast below the effective threshold
    ForecastBelowLimit,
    /// Current soil moisture under the critical floor
    CriticalSoil,
}

/// Numbers behind an evaluated decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionEvidence {
    /// Current VPD (kPa)
    pub vpd_kpa: f64,
    /// Threshold selected by the VPD band (fraction)
    pub dynamic_threshold: f64,
    /// Dynamic threshold minus margin (fraction)
    pub effective_threshold: f64,
    /// Predicted soil moisture (fraction)
    pub forecast_soil: f64,
    /// Measured soil moisture (fraction)
    pub current_soil: f64,
    /// Safety margin in effect (fraction)
    pub margin: f64,
}

/// Outcome of one decision cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Action
    pub label: DecisionLabel,
    /// Human-readable rationale
    pub reason: String,
    /// Rule that fired; `None` for degraded outcomes
    pub trigger: Option<Trigger>,
    /// Inputs and thresholds; `None` for degraded outcomes
    pub evidence: Option<DecisionEvidence>,
}

impl Decision {
    /// Device unreachable or stale
    pub fn offline() -> Self {
        Self {
            label: DecisionLabel::Offline,
            reason: "Lost connection to device".to_string(),
            trigger: None,
            evidence: None,
        }
    }

    /// History too short for a forecast
    pub fn waiting_for_data() -> Self {
        Self {
            label: DecisionLabel::WaitData,
            reason: "Collecting data...".to_string(),
            trigger: None,
            evidence: None,
        }
    }

    /// Payload merged into the live-status node after an evaluated cycle
    ///
    /// `None` for degraded outcomes, which persist nothing.
    pub fn live_update(&self, at: Timestamp) -> Option<DecisionRecord> {
        let evidence = self.evidence?;
        Some(DecisionRecord {
            ai_vpd_kpa: round_persisted(evidence.vpd_kpa),
            ai_dynamic_threshold: round_persisted(evidence.dynamic_threshold),
            ai_forecast_soil: round_persisted(evidence.forecast_soil),
            ai_last_decision: self.label,
            ai_last_update: format_wall_clock(at),
        })
    }
}

/// Persisted form of an evaluated decision
///
/// Merged into live status every cycle; appended to the decision log when
/// it carries new information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// VPD, 3 decimals (kPa)
    pub ai_vpd_kpa: f64,
    /// Dynamic threshold, 3 decimals
    pub ai_dynamic_threshold: f64,
    /// Forecast soil moisture, 3 decimals
    pub ai_forecast_soil: f64,
    /// Decision label
    pub ai_last_decision: DecisionLabel,
    /// Wall-clock time of the cycle (`YYYY-MM-DD HH:MM:SS`)
    pub ai_last_update: String,
}

/// Decide whether to irrigate
///
/// Pure: all inputs are fractions except `current_vpd_kpa`.
pub fn decide(
    forecast_soil_frac: f64,
    current_soil_frac: f64,
    current_vpd_kpa: f64,
    config: &PolicyConfig,
) -> Decision {
    let dynamic = dynamic_threshold(current_vpd_kpa, config);
    let effective = dynamic - config.margin;

    let pred_pct = whole_percent(forecast_soil_frac);
    let limit_pct = whole_percent(effective);

    let (mut label, mut trigger, mut reason) = (
        DecisionLabel::Wait,
        Trigger::ForecastStable,
        format!("Moisture Stable (Forecast {pred_pct}% >= Limit {limit_pct}%)"),
    );

    if forecast_soil_frac < effective {
        label = DecisionLabel::Irrigate;
        trigger = Trigger::ForecastBelowLimit;
        reason = format!("Soil Drying Out (Forecast {pred_pct}% < Limit {limit_pct}%)");
    }

    if current_soil_frac < CRITICAL_SOIL_FRAC {
        label = DecisionLabel::Irrigate;
        trigger = Trigger::CriticalSoil;
        reason = format!(
            "Emergency: Soil Critically Dry ({}%)",
            whole_percent(current_soil_frac)
        );
    }

    Decision {
        label,
        reason,
        trigger: Some(trigger),
        evidence: Some(DecisionEvidence {
            vpd_kpa: current_vpd_kpa,
            dynamic_threshold: dynamic,
            effective_threshold: effective,
            forecast_soil: forecast_soil_frac,
            current_soil: current_soil_frac,
            margin: config.margin,
        }),
    }
}

/// Fraction to whole percent, truncating toward zero
fn whole_percent(frac: f64) -> i64 {
    (frac * 100.0) as i64
}
