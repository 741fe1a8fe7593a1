//! One decision cycle against an in-memory greenhouse
//!
//! ```text
//! RUST_LOG=debug cargo run -p verdant-service --example decision_cycle
//! ```

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Local};
use serde_json::json;
use verdant_connectors::memory::MemoryStore;
use verdant_core::time::format_wall_clock;
use verdant_core::SystemTime;
use verdant_ml::{FeatureSchema, LinearPredictor};
use verdant_service::{GardenService, ServiceConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let offset_secs = Local::now().offset().local_minus_utc();
    let now = Local::now().naive_local();

    // An hour of uploads every two minutes, the bed slowly drying out
    let store = Arc::new(MemoryStore::new());
    for i in 0..30 {
        let at = now - Duration::minutes(2 * (29 - i));
        store.push_history(json!({
            "timestamp": format_wall_clock(at),
            "temperature": 26.5,
            "humidity": 58.0,
            "soilPercent": 74.0 - 0.15 * i as f64,
            "pumpState": 0,
        }));
    }
    store.set_live(json!({
        "timestamp": format_wall_clock(now),
        "temperature": 26.5,
        "humidity": 58.0,
        "soilPercent": 69.6,
        "pumpState": false,
    }));

    // soil a few readings ahead, extrapolated from its recent trend
    let model = LinearPredictor::new(
        FeatureSchema::new(["soil_moisture_frac", "sm_diff3"]),
        vec![1.0, 2.0],
        0.0,
    )?;

    let config = ServiceConfig::new("memory://").with_utc_offset_secs(offset_secs);
    let service = GardenService::new(config, store.clone())
        .with_predictor(Arc::new(model))
        .with_clock(Arc::new(SystemTime::with_offset_secs(offset_secs)));

    println!("live:        {}", serde_json::to_string(&service.live_status()?)?);
    println!("diagnostics: {}", serde_json::to_string_pretty(&service.diagnostics()?)?);
    println!("decision:    {}", serde_json::to_string_pretty(&service.irrigation_decision()?)?);

    // a second cycle with nothing new is not logged again
    service.irrigation_decision()?;
    println!("decision log entries: {}", store.decision_log().len());

    Ok(())
}
