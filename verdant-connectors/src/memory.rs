//! In-process store
//!
//! Behaves like the Realtime Database for the three device nodes: history
//! is ordered by push key, live status is a JSON object patched field by
//! field, and the decision log only grows. Push keys are zero-padded
//! counters so lexicographic order is insertion order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use verdant_core::{DecisionRecord, LiveStatus, RawRecord};

use crate::{DecisionLogStore, HistoryStore, LiveStateStore, StoreError};

/// Mutex-guarded store for tests and local runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    history: Mutex<BTreeMap<String, Value>>,
    live: Mutex<Option<Map<String, Value>>>,
    decisions: Mutex<Vec<(String, DecisionRecord)>>,
    next_key: AtomicU64,
    unavailable: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // the guarded data stays consistent even if a holder panicked
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn push_key(&self) -> String {
        format!("-M{:010}", self.next_key.fetch_add(1, Ordering::Relaxed))
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Request("store unavailable".into()));
        }
        Ok(())
    }

    /// Make every subsequent call fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Append a history record under a fresh push key
    pub fn push_history(&self, record: Value) -> String {
        let key = self.push_key();
        lock(&self.history).insert(key.clone(), record);
        key
    }

    /// Insert a history record under a caller-chosen key
    pub fn insert_history(&self, key: impl Into<String>, record: Value) {
        lock(&self.history).insert(key.into(), record);
    }

    /// Replace the live status; `null` and non-objects clear it
    pub fn set_live(&self, live: Value) {
        *lock(&self.live) = match live {
            Value::Object(map) => Some(map),
            _ => None,
        };
    }

    /// Live status as stored
    pub fn live_snapshot(&self) -> Option<Value> {
        lock(&self.live).clone().map(Value::Object)
    }

    /// Every decision-log entry, oldest first
    pub fn decision_log(&self) -> Vec<DecisionRecord> {
        lock(&self.decisions)
            .iter()
            .map(|(_, entry)| entry.clone())
            .collect()
    }
}

impl HistoryStore for MemoryStore {
    fn recent(&self, limit: usize) -> Result<Vec<RawRecord>, StoreError> {
        self.check_available()?;
        let history = lock(&self.history);
        let skip = history.len().saturating_sub(limit);
        Ok(history
            .iter()
            .skip(skip)
            .map(|(key, value)| RawRecord::from_value(Some(key.clone()), value.clone()))
            .collect())
    }
}

impl LiveStateStore for MemoryStore {
    fn live(&self) -> Result<Option<LiveStatus>, StoreError> {
        self.check_available()?;
        Ok(lock(&self.live).clone().map(|fields| LiveStatus { fields }))
    }

    fn merge(&self, update: &DecisionRecord) -> Result<(), StoreError> {
        self.check_available()?;
        let patch = match serde_json::to_value(update)? {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Serialization(format!(
                    "live update must be an object, got {}",
                    other
                )))
            }
        };
        lock(&self.live).get_or_insert_with(Map::new).extend(patch);
        Ok(())
    }
}

impl DecisionLogStore for MemoryStore {
    fn append(&self, entry: &DecisionRecord) -> Result<String, StoreError> {
        self.check_available()?;
        let key = self.push_key();
        lock(&self.decisions).push((key.clone(), entry.clone()));
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verdant_core::DecisionLabel;

    fn entry(label: DecisionLabel, forecast: f64) -> DecisionRecord {
        DecisionRecord {
            ai_vpd_kpa: 1.1,
            ai_dynamic_threshold: 0.7,
            ai_forecast_soil: forecast,
            ai_last_decision: label,
            ai_last_update: "2024-05-01 12:00:00".into(),
        }
    }

    #[test]
    fn test_recent_returns_last_records_in_key_order() {
        let store = MemoryStore::new();
        for soil in 60..70 {
            store.push_history(json!({ "soilPercent": soil }));
        }

        let recent = store.recent(3).unwrap();
        let soils: Vec<_> = recent.iter().map(|r| r.number("soilPercent").unwrap()).collect();
        assert_eq!(soils, vec![67.0, 68.0, 69.0]);
        assert!(recent.iter().all(|r| r.id.is_some()));

        assert_eq!(store.recent(100).unwrap().len(), 10);
    }

    #[test]
    fn test_empty_nodes_are_not_errors() {
        let store = MemoryStore::new();
        assert!(store.recent(20).unwrap().is_empty());
        assert!(store.live().unwrap().is_none());
    }

    #[test]
    fn test_merge_keeps_sensor_fields() {
        let store = MemoryStore::new();
        store.set_live(json!({ "soilPercent": 55, "ai_last_decision": "IRRIGATE" }));
        store.merge(&entry(DecisionLabel::Wait, 0.712)).unwrap();

        let live = store.live().unwrap().unwrap();
        assert_eq!(live.soil_percent(), Some(55.0));
        assert_eq!(live.previous_decision(), Some("WAIT"));
        assert_eq!(live.previous_forecast(), Some(0.712));
    }

    #[test]
    fn test_merge_creates_missing_live_node() {
        let store = MemoryStore::new();
        store.merge(&entry(DecisionLabel::Irrigate, 0.6)).unwrap();
        assert_eq!(
            store.live_snapshot().unwrap()["ai_last_decision"],
            json!("IRRIGATE")
        );
    }

    #[test]
    fn test_append_assigns_increasing_keys() {
        let store = MemoryStore::new();
        let a = store.append(&entry(DecisionLabel::Wait, 0.7)).unwrap();
        let b = store.append(&entry(DecisionLabel::Irrigate, 0.6)).unwrap();
        assert!(a < b);
        assert_eq!(store.decision_log().len(), 2);
    }

    #[test]
    fn test_unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.recent(1), Err(StoreError::Request(_))));
        assert!(store.live().is_err());
        assert!(store.append(&entry(DecisionLabel::Wait, 0.7)).is_err());

        store.set_unavailable(false);
        assert!(store.live().is_ok());
    }
}
