//! Integration tests for the policy chain
//!
//! Freshness → VPD → dynamic threshold → decision → change-aware logging,
//! run the way one service cycle runs them.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use serde_json::json;
use verdant_core::{
    check_live, decide, dynamic_threshold, should_log, vpd_kpa, DecisionLabel, FixedTime,
    LiveStatus, PolicyConfig, TimeSource, Trigger,
};

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
}

/// One cycle over a live node; `None` when the device is stale
fn cycle(live: &LiveStatus, forecast: f64, clock: &dyn TimeSource) -> Option<(DecisionLabel, bool)> {
    if !check_live(Some(live), clock).is_fresh {
        return None;
    }
    let cfg = PolicyConfig::default();
    let vpd = vpd_kpa(live.temperature(), live.humidity());
    let soil = live.soil_percent().unwrap_or(0.0) / 100.0;
    let decision = decide(forecast, soil, vpd, &cfg);
    let record = decision.live_update(clock.now())?;
    let log = should_log(
        record.ai_last_decision.as_str(),
        record.ai_forecast_soil,
        live.previous_decision(),
        live.previous_forecast(),
    );
    Some((decision.label, log))
}

#[test]
fn test_threshold_tracks_atmospheric_demand() {
    let cfg = PolicyConfig::default();
    // cool and humid, mild, hot and dry
    assert_eq!(dynamic_threshold(vpd_kpa(Some(18.0), Some(85.0)), &cfg), 0.65);
    assert_eq!(dynamic_threshold(vpd_kpa(Some(22.0), Some(65.0)), &cfg), 0.70);
    assert_eq!(dynamic_threshold(vpd_kpa(Some(30.0), Some(40.0)), &cfg), 0.72);
}

#[test]
fn test_same_forecast_higher_demand_flips_to_irrigate() {
    let cfg = PolicyConfig::default();
    let humid = decide(0.70, 0.70, vpd_kpa(Some(18.0), Some(85.0)), &cfg);
    let dry = decide(0.70, 0.70, vpd_kpa(Some(30.0), Some(40.0)), &cfg);

    assert_eq!(humid.label, DecisionLabel::Wait);
    assert_eq!(dry.label, DecisionLabel::Irrigate);
    assert_eq!(dry.trigger, Some(Trigger::ForecastBelowLimit));
}

#[test]
fn test_cycle_logs_first_then_only_on_change() {
    let clock = FixedTime::new(noon() + Duration::seconds(30));
    let mut live = LiveStatus::from_value(json!({
        "timestamp": "2024-05-01 12:00:00",
        "temperature": 24.0,
        "humidity": 60.0,
        "soilPercent": 66.0,
    }))
    .unwrap();

    let (label, logged) = cycle(&live, 0.6612, &clock).unwrap();
    assert_eq!(label, DecisionLabel::Irrigate);
    assert!(logged);

    // what the service merges back
    live.fields.insert("ai_last_decision".into(), json!("IRRIGATE"));
    live.fields.insert("ai_forecast_soil".into(), json!(0.661));

    assert_eq!(cycle(&live, 0.6608, &clock), Some((DecisionLabel::Irrigate, false)));
    assert_eq!(cycle(&live, 0.6616, &clock), Some((DecisionLabel::Irrigate, true)));
}

#[test]
fn test_stale_device_never_reaches_the_policy() {
    let clock = FixedTime::new(noon() + Duration::minutes(5));
    let live = LiveStatus::from_value(json!({
        "timestamp": "2024-05-01 12:00:00",
        "soilPercent": 10.0,
    }))
    .unwrap();
    assert_eq!(cycle(&live, 0.2, &clock), None);
}

proptest! {
    #[test]
    fn prop_dry_soil_always_irrigates(
        forecast in 0.0f64..1.0,
        soil in 0.0f64..0.4999,
        temp in -10.0f64..45.0,
        rh in 0.0f64..100.0,
    ) {
        let decision = decide(forecast, soil, vpd_kpa(Some(temp), Some(rh)), &PolicyConfig::default());
        prop_assert_eq!(decision.label, DecisionLabel::Irrigate);
        prop_assert_eq!(decision.trigger, Some(Trigger::CriticalSoil));
    }

    #[test]
    fn prop_repeat_cycle_never_logs(forecast in 0.0f64..1.0, label_irrigate in any::<bool>()) {
        let label = if label_irrigate { "IRRIGATE" } else { "WAIT" };
        let stored = verdant_core::round_persisted(forecast);
        prop_assert!(!should_log(label, stored, Some(label), Some(stored)));
    }
}
