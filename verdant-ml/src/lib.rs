//! Feature derivation and predictor boundary for Verdant
//!
//! ## Overview
//!
//! The forecaster that predicts soil moisture is trained offline, on
//! whatever columns the training notebook happened to produce. At run time
//! this crate rebuilds exactly those columns from the recent sensor history
//! and hands the most recent row to the model.
//!
//! ```text
//! RawRecord[] ─▶ columns::normalize_records ─▶ HistoryWindow
//!                                                  │
//!                                                  ▼
//!                        pipeline::derive_feature_vector(window, schema)
//!                                                  │
//!                                                  ▼
//!                                  Predictor::predict ─▶ forecast (0..1)
//! ```
//!
//! ## Derived columns
//!
//! | Column                 | Meaning                                        |
//! |------------------------|------------------------------------------------|
//! | `temperature_C`        | air temperature                                |
//! | `humidity_RH`          | relative humidity                              |
//! | `soil_moisture_frac`   | soil moisture, 0..1                            |
//! | `VPD_kPa`              | vapour-pressure deficit                        |
//! | `hour`                 | wall-clock hour of the reading                 |
//! | `sin_hour`, `cos_hour` | cyclical hour encoding                         |
//! | `sm_lag{k}`            | soil moisture k readings back, k ∈ 1,3,6,12,24,48 |
//! | `sm_roll{w}`           | trailing mean over w readings, w ∈ 3,6,12,24   |
//! | `sm_diff1`, `sm_diff3` | soil-moisture differences                      |
//!
//! Any other numeric field in the raw records passes through by name.
//!
//! ## Example
//!
//! ```rust
//! use chrono::FixedOffset;
//! use serde_json::json;
//! use verdant_core::RawRecord;
//! use verdant_ml::{derive_from_records, FeatureSchema, LinearPredictor, Predictor};
//!
//! let records: Vec<RawRecord> = (0..12)
//!     .map(|i| RawRecord::from_value(None, json!({
//!         "timestamp": format!("2024-05-01 06:{:02}:00", i),
//!         "temperature": 24.0,
//!         "humidity": 65.0,
//!         "soilPercent": 70 - i,
//!     })))
//!     .collect();
//!
//! let model = LinearPredictor::new(
//!     FeatureSchema::new(["soil_moisture_frac", "sm_diff1"]),
//!     vec![1.0, 1.0],
//!     0.0,
//! ).unwrap();
//!
//! let utc = FixedOffset::east_opt(0).unwrap();
//! let features = derive_from_records(&records, model.schema(), utc).unwrap();
//! let forecast = model.predict(&features).unwrap();
//! assert!((forecast - 0.58).abs() < 1e-9);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod columns;
pub mod pipeline;
pub mod predictor;
pub mod schema;

pub use columns::{normalize_record, normalize_records, ColumnAlias, COLUMN_ALIASES};
pub use pipeline::{derive_feature_vector, derive_from_records, FeatureFrame};
pub use predictor::{LinearPredictor, PredictError, Predictor};
pub use schema::{FeatureSchema, FeatureVector};

/// Canonical column names
pub mod names {
    /// Air temperature (°C)
    pub const TEMPERATURE: &str = "temperature_C";
    /// Relative humidity (%)
    pub const HUMIDITY: &str = "humidity_RH";
    /// Soil moisture fraction
    pub const SOIL_MOISTURE: &str = "soil_moisture_frac";
    /// Vapour-pressure deficit (kPa)
    pub const VPD: &str = "VPD_kPa";
    /// Wall-clock hour
    pub const HOUR: &str = "hour";
    /// sin(2π·hour/24)
    pub const SIN_HOUR: &str = "sin_hour";
    /// cos(2π·hour/24)
    pub const COS_HOUR: &str = "cos_hour";

    /// Soil moisture `k` readings back
    pub fn soil_lag(k: usize) -> String {
        format!("sm_lag{}", k)
    }

    /// Trailing soil-moisture mean over `w` readings
    pub fn soil_rolling(w: usize) -> String {
        format!("sm_roll{}", w)
    }

    /// Soil-moisture difference of order `k`
    pub fn soil_diff(k: usize) -> String {
        format!("sm_diff{}", k)
    }
}
