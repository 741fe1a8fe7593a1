//! History window → model-ready feature vector
//!
//! The pipeline builds a small column store ([`FeatureFrame`]) over the
//! window, derives every feature it knows how to compute, then selects the
//! most recent row in the order the model asks for:
//!
//! ```text
//! HistoryWindow ─▶ FeatureFrame ─┬─ base:     temperature_C, humidity_RH, soil_moisture_frac, extras
//!                                ├─ physics:  VPD_kPa
//!                                ├─ calendar: hour, sin_hour, cos_hour
//!                                └─ soil:     sm_lag{k}, sm_roll{w}, sm_diff{1,3}
//!                                        │
//!                                        ▼
//!                        last row, schema order, ffill ─▶ 0
//! ```
//!
//! Derivation never fails on missing columns or short history: a column the
//! model wants but the frame lacks is zero, and an empty cell in the last
//! row takes the column's last valid value, or zero if there is none. The
//! only error is an empty window, which [`HistoryWindow`] already rules out.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::{FixedOffset, Timelike};
use log::{debug, trace};
use verdant_core::{vpd_kpa, CoreResult, HistoryWindow, RawRecord};

use crate::columns::normalize_records;
use crate::names;
use crate::schema::{FeatureSchema, FeatureVector};

/// Soil-moisture lag offsets, in steps
pub const LAG_STEPS: [usize; 6] = [1, 3, 6, 12, 24, 48];

/// Trailing rolling-mean windows, in steps
pub const ROLLING_WINDOWS: [usize; 4] = [3, 6, 12, 24];

/// Soil-moisture difference orders
pub const DIFF_ORDERS: [usize; 2] = [1, 3];

type Column = Vec<Option<f64>>;

/// Column-oriented view of a history window with derived features
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    rows: usize,
    columns: BTreeMap<String, Column>,
}

impl FeatureFrame {
    /// Build every derived column for the window
    pub fn from_window(window: &HistoryWindow) -> Self {
        let readings = window.readings();
        let rows = readings.len();
        let mut columns: BTreeMap<String, Column> = BTreeMap::new();

        // Extras first so derived names win on collision
        for (i, reading) in readings.iter().enumerate() {
            for (name, value) in &reading.extras {
                columns
                    .entry(name.clone())
                    .or_insert_with(|| vec![None; rows])[i] = Some(*value);
            }
        }

        let soil: Column = readings.iter().map(|r| r.soil_moisture_frac).collect();
        let hour: Column = readings
            .iter()
            .map(|r| Some(f64::from(r.timestamp.hour())))
            .collect();

        columns.insert(
            names::TEMPERATURE.into(),
            readings.iter().map(|r| r.temperature_c).collect(),
        );
        columns.insert(
            names::HUMIDITY.into(),
            readings.iter().map(|r| r.humidity_rh).collect(),
        );
        columns.insert(
            names::VPD.into(),
            readings
                .iter()
                .map(|r| Some(vpd_kpa(r.temperature_c, r.humidity_rh)))
                .collect(),
        );
        columns.insert(names::SIN_HOUR.into(), map(&hour, |h| libm::sin(2.0 * PI * h / 24.0)));
        columns.insert(names::COS_HOUR.into(), map(&hour, |h| libm::cos(2.0 * PI * h / 24.0)));
        columns.insert(names::HOUR.into(), hour);

        for k in LAG_STEPS {
            columns.insert(names::soil_lag(k), shift(&soil, k));
        }
        for w in ROLLING_WINDOWS {
            columns.insert(names::soil_rolling(w), rolling_mean(&soil, w));
        }
        for k in DIFF_ORDERS {
            columns.insert(names::soil_diff(k), diff(&soil, k));
        }
        columns.insert(names::SOIL_MOISTURE.into(), soil);

        Self { rows, columns }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// One column, oldest row first
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Names of all columns the frame carries
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    /// Most recent row, selected and filled for `schema`
    pub fn last_row(&self, schema: &FeatureSchema) -> FeatureVector {
        let mut absent = 0usize;
        let mut carried = 0usize;
        let mut zeroed = 0usize;

        let values = schema
            .names()
            .iter()
            .map(|name| match self.columns.get(name) {
                None => {
                    absent += 1;
                    0.0
                }
                Some(column) => match column.last().copied().flatten() {
                    Some(v) => v,
                    None => match column.iter().rev().find_map(|v| *v) {
                        Some(v) => {
                            carried += 1;
                            v
                        }
                        None => {
                            zeroed += 1;
                            0.0
                        }
                    },
                },
            })
            .collect();

        if absent + carried + zeroed > 0 {
            debug!(
                "feature row over {} readings: {} absent, {} forward-filled, {} zero-filled",
                self.rows, absent, carried, zeroed
            );
        }

        FeatureVector::new(schema.clone(), values)
    }
}

fn map(column: &[Option<f64>], f: impl Fn(f64) -> f64) -> Column {
    column.iter().map(|v| v.map(&f)).collect()
}

/// Value `k` steps back
fn shift(column: &[Option<f64>], k: usize) -> Column {
    (0..column.len())
        .map(|i| i.checked_sub(k).and_then(|j| column[j]))
        .collect()
}

/// Trailing mean; a window that is short or has a gap is empty
fn rolling_mean(column: &[Option<f64>], w: usize) -> Column {
    (0..column.len())
        .map(|i| {
            let start = (i + 1).checked_sub(w)?;
            let sum = column[start..=i]
                .iter()
                .try_fold(0.0, |acc, v| v.map(|v| acc + v))?;
            Some(sum / w as f64)
        })
        .collect()
}

/// Difference with the value `k` steps back
fn diff(column: &[Option<f64>], k: usize) -> Column {
    (0..column.len())
        .map(|i| {
            let j = i.checked_sub(k)?;
            Some(column[i]? - column[j]?)
        })
        .collect()
}

/// Derive the feature vector for the most recent reading in `window`
pub fn derive_feature_vector(window: &HistoryWindow, schema: &FeatureSchema) -> FeatureVector {
    let frame = FeatureFrame::from_window(window);
    trace!("feature frame: {} rows, {} columns", frame.rows(), frame.columns.len());
    frame.last_row(schema)
}

/// Normalize raw store records, then derive as [`derive_feature_vector`]
///
/// Fails only when `records` is empty.
pub fn derive_from_records(
    records: &[RawRecord],
    schema: &FeatureSchema,
    offset: FixedOffset,
) -> CoreResult<FeatureVector> {
    let window = HistoryWindow::new(normalize_records(records, offset))?;
    Ok(derive_feature_vector(&window, schema))
}
