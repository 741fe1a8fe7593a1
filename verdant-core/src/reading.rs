//! Sensor records as the core sees them
//!
//! Two shapes exist:
//!
//! - [`RawRecord`] / [`LiveStatus`]: schema-less JSON objects exactly as the
//!   store returns them. Field names and value types drift between firmware
//!   versions (`temp` vs `temperature`, `pumpState: 1` vs `true`, forecasts
//!   stored as strings), so they are kept as maps with lenient accessors.
//! - [`SensorReading`]: one normalized, typed observation, produced by the
//!   feature pipeline's column normalization and consumed read-only after.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CoreError, CoreResult};
use crate::time::{RawTimestamp, Timestamp};

/// One normalized, time-stamped observation
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    /// Device wall-clock time of the observation
    pub timestamp: Timestamp,
    /// Air temperature (°C)
    pub temperature_c: Option<f64>,
    /// Relative humidity (0-100)
    pub humidity_rh: Option<f64>,
    /// Soil moisture as a fraction (0.0-1.0)
    pub soil_moisture_frac: Option<f64>,
    /// Whether the pump was running
    pub pump_state: Option<bool>,
    /// Any other numeric fields the device reported, by their source name
    pub extras: BTreeMap<String, f64>,
}

impl SensorReading {
    /// Reading with only a timestamp
    pub fn at(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            temperature_c: None,
            humidity_rh: None,
            soil_moisture_frac: None,
            pump_state: None,
            extras: BTreeMap::new(),
        }
    }

    /// Set temperature and humidity
    pub fn with_climate(mut self, temperature_c: f64, humidity_rh: f64) -> Self {
        self.temperature_c = Some(temperature_c);
        self.humidity_rh = Some(humidity_rh);
        self
    }

    /// Set soil moisture fraction
    pub fn with_soil(mut self, soil_moisture_frac: f64) -> Self {
        self.soil_moisture_frac = Some(soil_moisture_frac);
        self
    }
}

/// Chronologically ordered readings, oldest first
///
/// Never empty. The window is bounded by whoever fetched it (normally the
/// 60 most recent records); the core enforces no upper limit.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryWindow {
    readings: Vec<SensorReading>,
}

impl HistoryWindow {
    /// Sort readings by timestamp (stable, so ties keep arrival order)
    pub fn new(mut readings: Vec<SensorReading>) -> CoreResult<Self> {
        if readings.is_empty() {
            return Err(CoreError::EmptyWindow);
        }
        readings.sort_by_key(|r| r.timestamp);
        Ok(Self { readings })
    }

    /// Readings, oldest first
    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    /// Most recent reading
    pub fn latest(&self) -> &SensorReading {
        // non-empty by construction
        &self.readings[self.readings.len() - 1]
    }

    /// Number of readings
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Always false; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Soil moisture column, oldest first
    pub fn soil_series(&self) -> Vec<Option<f64>> {
        self.readings.iter().map(|r| r.soil_moisture_frac).collect()
    }
}

/// One history record as stored, keyed by its store id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Store key (push id), when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Remaining fields, verbatim
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawRecord {
    /// Record from a JSON object; non-objects yield an empty record
    pub fn from_value(id: Option<String>, value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { id, fields }
    }

    /// Lenient numeric lookup
    pub fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(value_as_f64)
    }
}

/// The device's live-status node
///
/// Holds the latest sensor snapshot plus whatever the previous decision
/// cycle merged into it (`ai_last_decision`, `ai_forecast_soil`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LiveStatus {
    /// Fields, verbatim
    pub fields: Map<String, Value>,
}

impl LiveStatus {
    /// Live status from a JSON value; `null` and non-objects yield `None`
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Upload timestamp, if the device wrote one
    pub fn timestamp(&self) -> Option<RawTimestamp> {
        match self.fields.get("timestamp")? {
            Value::String(text) => Some(RawTimestamp::Text(text.clone())),
            Value::Number(n) => n.as_f64().map(RawTimestamp::Epoch),
            Value::Null => None,
            // present but unusable: still "has a timestamp", just malformed
            _ => Some(RawTimestamp::Text(String::new())),
        }
    }

    /// Air temperature (°C)
    pub fn temperature(&self) -> Option<f64> {
        self.fields.get("temperature").and_then(value_as_f64)
    }

    /// Relative humidity (%)
    pub fn humidity(&self) -> Option<f64> {
        self.fields.get("humidity").and_then(value_as_f64)
    }

    /// Soil moisture (%)
    pub fn soil_percent(&self) -> Option<f64> {
        self.fields.get("soilPercent").and_then(value_as_f64)
    }

    /// Pump state; absent or unreadable counts as off
    pub fn pump_on(&self) -> bool {
        self.fields
            .get("pumpState")
            .and_then(value_as_bool)
            .unwrap_or(false)
    }

    /// Decision label persisted by the previous cycle
    pub fn previous_decision(&self) -> Option<&str> {
        self.fields.get("ai_last_decision").and_then(Value::as_str)
    }

    /// Forecast persisted by the previous cycle
    ///
    /// Unparseable values count as absent.
    pub fn previous_forecast(&self) -> Option<f64> {
        self.fields.get("ai_forecast_soil").and_then(value_as_f64)
    }
}

/// Interpret a JSON value as a number
///
/// Accepts numbers, numeric strings and booleans (1/0). Non-finite results
/// are rejected.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Interpret a JSON value as a boolean (true/false, non-zero, "1"/"true"/"on")
pub fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" => Some(true),
            "0" | "false" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn live_status_lenient_fields() {
        let live = LiveStatus::from_value(json!({
            "timestamp": "2024-05-01 12:00:00",
            "temperature": "24.5",
            "humidity": 61,
            "soilPercent": 48.0,
            "pumpState": 1,
            "ai_last_decision": "WAIT",
            "ai_forecast_soil": "n/a",
        }))
        .unwrap();

        assert_eq!(live.temperature(), Some(24.5));
        assert_eq!(live.humidity(), Some(61.0));
        assert_eq!(live.soil_percent(), Some(48.0));
        assert!(live.pump_on());
        assert_eq!(live.previous_decision(), Some("WAIT"));
        assert_eq!(live.previous_forecast(), None);
    }

    #[test]
    fn null_live_status_is_absent() {
        assert!(LiveStatus::from_value(Value::Null).is_none());
    }

    #[test]
    fn non_string_timestamp_is_malformed_not_missing() {
        let live = LiveStatus::from_value(json!({ "timestamp": [1, 2] })).unwrap();
        assert_eq!(live.timestamp(), Some(RawTimestamp::Text(String::new())));

        let none = LiveStatus::from_value(json!({ "temperature": 20 })).unwrap();
        assert_eq!(none.timestamp(), None);
    }

    #[test]
    fn history_window_sorts_and_rejects_empty() {
        use chrono::NaiveDate;
        let at = |h| {
            NaiveDate::from_ymd_opt(2024, 5, 1)
                .and_then(|d| d.and_hms_opt(h, 0, 0))
                .unwrap()
        };
        let window = HistoryWindow::new(vec![
            SensorReading::at(at(3)).with_soil(0.3),
            SensorReading::at(at(1)).with_soil(0.1),
            SensorReading::at(at(2)).with_soil(0.2),
        ])
        .unwrap();

        assert_eq!(window.soil_series(), vec![Some(0.1), Some(0.2), Some(0.3)]);
        assert_eq!(window.latest().timestamp, at(3));
        assert_eq!(HistoryWindow::new(Vec::new()), Err(CoreError::EmptyWindow));
    }

    #[test]
    fn raw_record_keeps_id_and_fields() {
        let record = RawRecord::from_value(Some("-Nx01".into()), json!({ "soilPercent": 71 }));
        assert_eq!(record.number("soilPercent"), Some(71.0));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({ "id": "-Nx01", "soilPercent": 71 }));
    }
}
