//! Shared history generators for feature-pipeline tests

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use verdant_core::RawRecord;

/// A drying bed: soil falls a little every reading, with sensor noise,
/// while temperature follows a gentle daily swing.
pub fn drying_history(len: usize, seed: u64) -> Vec<RawRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|i| {
            let minutes = i * 10;
            let hour = (6 + minutes / 60) % 24;
            let soil = 78.0 - 0.4 * i as f64 + rng.gen_range(-0.5..0.5);
            RawRecord::from_value(
                Some(format!("-N{:05}", i)),
                json!({
                    "timestamp": format!("2024-05-01 {:02}:{:02}:00", hour, minutes % 60),
                    "temperature": 22.0 + 4.0 * (i as f64 / 12.0).sin(),
                    "humidity": rng.gen_range(55.0..75.0),
                    "soilPercent": soil,
                    "pumpState": 0,
                }),
            )
        })
        .collect()
}

/// Same records, shuffled deterministically
pub fn shuffled(mut records: Vec<RawRecord>, seed: u64) -> Vec<RawRecord> {
    use rand::seq::SliceRandom;
    records.shuffle(&mut StdRng::seed_from_u64(seed));
    records
}

/// A record with whatever fields the caller gives
pub fn record(fields: Value) -> RawRecord {
    RawRecord::from_value(None, fields)
}
