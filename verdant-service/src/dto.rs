//! Response bodies
//!
//! Field names are part of the dashboard contract and must not change.

use serde::Serialize;
use verdant_core::dedup::round_to;
use verdant_core::{round_persisted, Decision, DecisionLabel, Freshness, HealthStatus, HealthVerdict, LiveStatus};

/// `GET /sensors/live`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiveStatusResponse {
    /// Fresh snapshot, exactly as stored
    Online(LiveStatus),
    /// Device stale or never seen
    Offline(OfflineStatus),
}

/// Marker returned instead of a stale snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfflineStatus {
    /// Always `OFFLINE`
    pub status: &'static str,
    /// Always `Device disconnected`
    pub message: &'static str,
    /// Whole seconds since the last upload, `-1` when unknown
    pub last_seen_seconds: i64,
}

impl OfflineStatus {
    /// Marker for a failed freshness check
    pub fn from_freshness(freshness: &Freshness) -> Self {
        let last_seen_seconds = match freshness.age_secs {
            Some(age) if age != 0.0 => age.trunc() as i64,
            _ => -1,
        };
        Self {
            status: "OFFLINE",
            message: "Device disconnected",
            last_seen_seconds,
        }
    }
}

/// `GET /system/diagnostics`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsResponse {
    /// Verdict
    pub health_status: HealthStatus,
    /// Alert messages
    pub alerts: Vec<String>,
    /// Measured minus expected, percentage points (2 dp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation_percent: Option<f64>,
    /// Model expectation, % (2 dp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_expected_soil: Option<f64>,
    /// Measurement, % (2 dp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_current_soil: Option<f64>,
    /// Wall-clock time of the check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl DiagnosticsResponse {
    fn alerts_of(verdict: &HealthVerdict) -> Vec<String> {
        verdict.alerts.iter().map(ToString::to_string).collect()
    }

    /// Device stale: `OFFLINE`, one alert, zero deviation
    pub fn offline() -> Self {
        let verdict = HealthVerdict::offline();
        Self {
            health_status: verdict.status,
            alerts: Self::alerts_of(&verdict),
            deviation_percent: Some(verdict.deviation_percent),
            ai_expected_soil: None,
            real_current_soil: None,
            timestamp: None,
        }
    }

    /// History too short: `WAITING_DATA`, no alerts
    pub fn waiting_for_data() -> Self {
        let verdict = HealthVerdict::waiting_for_data();
        Self {
            health_status: verdict.status,
            alerts: Self::alerts_of(&verdict),
            deviation_percent: None,
            ai_expected_soil: None,
            real_current_soil: None,
            timestamp: None,
        }
    }

    /// Full report for an evaluated cycle
    pub fn evaluated(
        verdict: &HealthVerdict,
        forecast_soil_frac: f64,
        current_soil_frac: f64,
        timestamp: String,
    ) -> Self {
        Self {
            health_status: verdict.status,
            alerts: Self::alerts_of(verdict),
            deviation_percent: Some(round_to(verdict.deviation_percent, 2)),
            ai_expected_soil: Some(round_to(forecast_soil_frac * 100.0, 2)),
            real_current_soil: Some(round_to(current_soil_frac * 100.0, 2)),
            timestamp: Some(timestamp),
        }
    }
}

/// `GET /irrigation/decision`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionResponse {
    /// Action
    pub decision: DecisionLabel,
    /// VPD (kPa, 3 dp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpd_kpa: Option<f64>,
    /// Band threshold before margin (3 dp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_threshold: Option<f64>,
    /// Forecast soil fraction (3 dp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_soil: Option<f64>,
    /// Rationale
    pub reason: String,
    /// Margin subtracted from the threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
}

impl From<&Decision> for DecisionResponse {
    fn from(decision: &Decision) -> Self {
        let evidence = decision.evidence;
        Self {
            decision: decision.label,
            vpd_kpa: evidence.map(|e| round_persisted(e.vpd_kpa)),
            dynamic_threshold: evidence.map(|e| round_persisted(e.dynamic_threshold)),
            forecast_soil: evidence.map(|e| round_persisted(e.forecast_soil)),
            reason: decision.reason.clone(),
            margin: evidence.map(|e| e.margin),
        }
    }
}
