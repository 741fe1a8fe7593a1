use chrono::FixedOffset;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use verdant_core::{HistoryWindow, RawRecord};
use verdant_ml::{derive_feature_vector, normalize_records, FeatureSchema};

fn history(len: usize) -> Vec<RawRecord> {
    (0..len)
        .map(|i| {
            RawRecord::from_value(
                None,
                json!({
                    "timestamp": format!("2024-05-01 {:02}:{:02}:00", 6 + i / 60, i % 60),
                    "temperature": 24.0,
                    "humidity": 62.0,
                    "soilPercent": 80.0 - 0.1 * i as f64,
                }),
            )
        })
        .collect()
}

fn schema() -> FeatureSchema {
    FeatureSchema::new([
        "VPD_kPa", "soil_moisture_frac", "sin_hour", "cos_hour", "sm_lag1", "sm_lag6",
        "sm_lag24", "sm_roll3", "sm_roll12", "sm_diff1", "sm_diff3",
    ])
}

fn bench_derive(c: &mut Criterion) {
    let utc = FixedOffset::east_opt(0).unwrap();
    let schema = schema();
    let mut group = c.benchmark_group("derive_feature_vector");

    for len in [12usize, 60, 240] {
        let records = history(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &records, |b, records| {
            b.iter(|| {
                let window = HistoryWindow::new(normalize_records(records, utc)).unwrap();
                black_box(derive_feature_vector(&window, &schema))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_derive);
criterion_main!(benches);
