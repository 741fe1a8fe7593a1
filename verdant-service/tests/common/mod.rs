//! Fixtures for service tests: a seeded store, a fixed clock and
//! predictors with known output.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use verdant_connectors::memory::MemoryStore;
use verdant_core::time::format_wall_clock;
use verdant_core::FixedTime;
use verdant_ml::{FeatureSchema, FeatureVector, PredictError, Predictor};
use verdant_service::{GardenService, ServiceConfig};

/// Time of the last upload in every scenario
pub fn upload_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
}

/// Clock `secs` after the last upload
pub fn clock_after(secs: i64) -> Arc<FixedTime> {
    Arc::new(FixedTime::new(upload_time() + Duration::seconds(secs)))
}

/// Predictor that always forecasts the same value
pub struct ConstantPredictor {
    schema: FeatureSchema,
    forecast: f64,
}

impl ConstantPredictor {
    pub fn new(forecast: f64) -> Arc<Self> {
        Arc::new(Self {
            schema: FeatureSchema::fallback(),
            forecast,
        })
    }
}

impl Predictor for ConstantPredictor {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictError> {
        assert_eq!(features.schema(), &self.schema);
        Ok(self.forecast)
    }
}

/// Predictor whose model is broken
pub struct BrokenPredictor(FeatureSchema);

impl BrokenPredictor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self(FeatureSchema::fallback()))
    }
}

impl Predictor for BrokenPredictor {
    fn schema(&self) -> &FeatureSchema {
        &self.0
    }

    fn predict(&self, _: &FeatureVector) -> Result<f64, PredictError> {
        Err(PredictError::NonFinite)
    }
}

/// `count` history uploads, two minutes apart, ending at [`upload_time`]
pub fn seed_history(store: &MemoryStore, count: usize) {
    for i in 0..count {
        let age = Duration::minutes(2 * (count - 1 - i) as i64);
        store.push_history(json!({
            "timestamp": format_wall_clock(upload_time() - age),
            "temperature": 25.0,
            "humidity": 60.0,
            "soilPercent": 75.0 - 0.2 * i as f64,
            "pumpState": 0,
        }));
    }
}

/// Live node as the device writes it at [`upload_time`]
pub fn live_node(soil_percent: f64, pump_on: bool) -> Value {
    json!({
        "timestamp": format_wall_clock(upload_time()),
        "temperature": 25.0,
        "humidity": 60.0,
        "soilPercent": soil_percent,
        "pumpState": pump_on,
    })
}

/// Store with 30 history records and a live node
pub fn seeded_store(soil_percent: f64, pump_on: bool) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    seed_history(&store, 30);
    store.set_live(live_node(soil_percent, pump_on));
    store
}

/// Service over `store` one minute after the last upload
pub fn service(store: &Arc<MemoryStore>, predictor: Arc<dyn Predictor>) -> GardenService {
    GardenService::new(ServiceConfig::new("https://garden.firebaseio.com"), store.clone())
        .with_predictor(predictor)
        .with_clock(clock_after(60))
}
