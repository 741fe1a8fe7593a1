//! Column normalization
//!
//! History records come from several firmware generations and a couple of
//! import scripts, each with its own idea of field names and units. This
//! module maps them onto the canonical names the rest of the pipeline uses.
//!
//! The mapping is a plain table, not code: [`COLUMN_ALIASES`] lists, for each
//! canonical field, the accepted source names in priority order and the
//! divisor that converts them. The first alias present (and numeric) in a
//! record wins.
//!
//! | Canonical            | Sources (priority order)                      | Divisor |
//! |----------------------|-----------------------------------------------|---------|
//! | `temperature_C`      | `temperature_C`, `temperature`, `temp`        | 1       |
//! | `humidity_RH`        | `humidity_RH`, `humidity`, `humid`            | 1       |
//! | `soil_moisture_frac` | `soil_moisture_frac`                          | 1       |
//! | `soil_moisture_frac` | `soilPercent`                                 | 100     |
//! | `soil_moisture_frac` | `soil_moisture_percent`                       | 1       |
//!
//! A record whose timestamp is missing or unreadable takes the slot right
//! after its predecessor in store order, or its position when it is first.
//!
//! Fields not consumed by the table pass through under their own name when
//! they hold a number, so a model trained on extra device channels can still
//! find them.

use std::collections::BTreeMap;

use chrono::{Duration, FixedOffset};
use log::warn;
use serde_json::Value;
use verdant_core::reading::{value_as_bool, value_as_f64};
use verdant_core::{RawRecord, RawTimestamp, SensorReading, Timestamp};

use crate::names::{HUMIDITY, SOIL_MOISTURE, TEMPERATURE};

/// One row of the alias table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnAlias {
    /// Canonical field name
    pub canonical: &'static str,
    /// Accepted source names, highest priority first
    pub sources: &'static [&'static str],
    /// Source value is divided by this
    pub divisor: f64,
}

/// Canonical field ← source aliases
///
/// `soil_moisture_percent` is taken as-is: historical imports wrote the
/// fraction under that name.
pub const COLUMN_ALIASES: &[ColumnAlias] = &[
    ColumnAlias {
        canonical: TEMPERATURE,
        sources: &["temperature_C", "temperature", "temp"],
        divisor: 1.0,
    },
    ColumnAlias {
        canonical: HUMIDITY,
        sources: &["humidity_RH", "humidity", "humid"],
        divisor: 1.0,
    },
    ColumnAlias {
        canonical: SOIL_MOISTURE,
        sources: &["soil_moisture_frac"],
        divisor: 1.0,
    },
    ColumnAlias {
        canonical: SOIL_MOISTURE,
        sources: &["soilPercent"],
        divisor: 100.0,
    },
    ColumnAlias {
        canonical: SOIL_MOISTURE,
        sources: &["soil_moisture_percent"],
        divisor: 1.0,
    },
];

/// Source names for the pump state
pub const PUMP_ALIASES: &[&str] = &["pumpState", "pump_state"];

/// Source name for the record timestamp
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Look up a canonical field in one record
pub fn resolve(record: &RawRecord, canonical: &str) -> Option<f64> {
    COLUMN_ALIASES
        .iter()
        .filter(|alias| alias.canonical == canonical)
        .flat_map(|alias| alias.sources.iter().map(move |src| (src, alias.divisor)))
        .find_map(|(src, divisor)| record.number(src).map(|v| v / divisor))
}

fn consumed_by_table(field: &str) -> bool {
    field == TIMESTAMP_FIELD
        || COLUMN_ALIASES
            .iter()
            .any(|alias| alias.sources.contains(&field))
}

fn record_timestamp(record: &RawRecord, offset: FixedOffset) -> Option<Timestamp> {
    let raw = match record.fields.get(TIMESTAMP_FIELD)? {
        Value::String(text) => RawTimestamp::Text(text.clone()),
        Value::Number(n) => RawTimestamp::Epoch(n.as_f64()?),
        _ => return None,
    };
    raw.resolve(offset)
}

/// Timestamp for a record that has none: its position, in nanoseconds
/// after the epoch, so arrival order survives the chronological sort.
fn positional_timestamp(index: usize) -> Timestamp {
    chrono::DateTime::from_timestamp_nanos(index as i64).naive_utc()
}

/// Normalize one record, placing it at `index` if it carries no timestamp
pub fn normalize_record(record: &RawRecord, index: usize, offset: FixedOffset) -> SensorReading {
    normalize_with_fallback(record, positional_timestamp(index), offset)
}

fn normalize_with_fallback(
    record: &RawRecord,
    fallback: Timestamp,
    offset: FixedOffset,
) -> SensorReading {
    let timestamp = match record_timestamp(record, offset) {
        Some(timestamp) => timestamp,
        None => {
            if let Some(raw) = record.fields.get(TIMESTAMP_FIELD).filter(|v| !v.is_null()) {
                warn!("unreadable timestamp {} in record {:?}, using store order", raw, record.id);
            }
            fallback
        }
    };

    let extras: BTreeMap<String, f64> = record
        .fields
        .iter()
        .filter(|(name, _)| !consumed_by_table(name))
        .filter_map(|(name, value)| value_as_f64(value).map(|v| (name.clone(), v)))
        .collect();

    SensorReading {
        timestamp,
        temperature_c: resolve(record, TEMPERATURE),
        humidity_rh: resolve(record, HUMIDITY),
        soil_moisture_frac: resolve(record, SOIL_MOISTURE),
        pump_state: PUMP_ALIASES
            .iter()
            .find_map(|src| record.fields.get(*src).and_then(value_as_bool)),
        extras,
    }
}

/// Normalize a batch of records, in the order given
pub fn normalize_records(records: &[RawRecord], offset: FixedOffset) -> Vec<SensorReading> {
    let mut previous: Option<Timestamp> = None;
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let fallback = previous
                .and_then(|t| t.checked_add_signed(Duration::nanoseconds(1)))
                .unwrap_or_else(|| positional_timestamp(index));
            let reading = normalize_with_fallback(record, fallback, offset);
            previous = Some(reading.timestamp);
            reading
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn record(value: Value) -> RawRecord {
        RawRecord::from_value(None, value)
    }

    #[test]
    fn alternate_spellings_map_to_canonical() {
        let reading = normalize_record(
            &record(json!({
                "timestamp": "2024-05-01 06:00:00",
                "temp": 21.5,
                "humid": 70,
                "soilPercent": 64,
            })),
            0,
            utc(),
        );

        assert_eq!(reading.temperature_c, Some(21.5));
        assert_eq!(reading.humidity_rh, Some(70.0));
        assert_eq!(reading.soil_moisture_frac, Some(0.64));
        assert_eq!(reading.timestamp.hour(), 6);
    }

    #[test]
    fn canonical_name_beats_alias() {
        let r = record(json!({ "temperature_C": 20.0, "temperature": 99.0 }));
        assert_eq!(resolve(&r, TEMPERATURE), Some(20.0));

        let soil = record(json!({ "soil_moisture_frac": 0.5, "soilPercent": 80 }));
        assert_eq!(resolve(&soil, SOIL_MOISTURE), Some(0.5));
    }

    #[test]
    fn soil_percent_field_taken_verbatim() {
        let r = record(json!({ "soil_moisture_percent": 0.61 }));
        assert_eq!(resolve(&r, SOIL_MOISTURE), Some(0.61));
    }

    #[test]
    fn device_percent_beats_imported_percent() {
        let r = record(json!({ "soilPercent": 64, "soil_moisture_percent": 64 }));
        assert_eq!(resolve(&r, SOIL_MOISTURE), Some(0.64));
    }

    #[test]
    fn unknown_numeric_fields_pass_through() {
        let reading = normalize_record(
            &record(json!({
                "timestamp": "2024-05-01 06:00:00",
                "pumpState": 1,
                "lux": "1200",
                "note": "watered by hand",
                "temperature": 20,
            })),
            0,
            utc(),
        );

        assert_eq!(reading.pump_state, Some(true));
        assert_eq!(reading.extras.get("pumpState"), Some(&1.0));
        assert_eq!(reading.extras.get("lux"), Some(&1200.0));
        assert!(!reading.extras.contains_key("note"));
        assert!(!reading.extras.contains_key("temperature"));
    }

    #[test]
    fn missing_timestamp_falls_back_to_position() {
        let readings = normalize_records(
            &[record(json!({ "soilPercent": 60 })), record(json!({ "soilPercent": 59 }))],
            utc(),
        );
        assert!(readings[0].timestamp < readings[1].timestamp);
        assert_eq!(readings[1].timestamp.hour(), 0);
    }

    #[test]
    fn unreadable_timestamp_follows_its_predecessor() {
        let readings = normalize_records(
            &[
                record(json!({ "timestamp": "2024-05-01 06:00:00", "soilPercent": 62 })),
                record(json!({ "timestamp": "2024-05-01 06:10:00", "soilPercent": 61 })),
                record(json!({ "timestamp": "sometime", "soilPercent": 50 })),
            ],
            utc(),
        );

        assert!(readings[2].timestamp > readings[1].timestamp);
        assert_eq!(readings[2].timestamp.hour(), 6);
        assert_eq!(readings[2].timestamp.minute(), 10);
    }

    #[test]
    fn leading_unreadable_timestamp_keeps_its_position() {
        let readings = normalize_records(
            &[
                record(json!({ "timestamp": false, "soilPercent": 63 })),
                record(json!({ "timestamp": "2024-05-01 06:00:00", "soilPercent": 62 })),
            ],
            utc(),
        );
        assert!(readings[0].timestamp < readings[1].timestamp);
    }
}
