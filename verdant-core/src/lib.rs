//! Physics and policy core for Verdant
//!
//! Turns a live greenhouse reading plus a model forecast into an irrigation
//! action and a device-health verdict.
//!
//! Everything here is synchronous, allocation-light and free of shared
//! mutable state: configuration is immutable after start-up and every
//! operation is a pure function of its inputs, so concurrent requests can
//! call into the core without locking.
//!
//! Per decision cycle:
//!
//! ```text
//! live reading ─▶ freshness gate ─▶ (history ─▶ features ─▶ predictor)
//!                      │                                       │
//!                      ▼                                       ▼
//!                   OFFLINE          VPD ─▶ dynamic threshold ─▶ decide ─▶ should_log
//! ```
//!
//! ```rust
//! use verdant_core::{decide, dynamic_threshold, vpd_kpa, DecisionLabel, PolicyConfig};
//!
//! let cfg = PolicyConfig::default();
//! let vpd = vpd_kpa(Some(27.0), Some(55.0));      // ~1.6 kPa, high demand
//! assert_eq!(dynamic_threshold(vpd, &cfg), cfg.thr_hi);
//!
//! let decision = decide(0.74, 0.71, vpd, &cfg);
//! assert_eq!(decision.label, DecisionLabel::Wait);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod decision;
pub mod dedup;
pub mod errors;
pub mod freshness;
pub mod health;
pub mod policy;
pub mod reading;
pub mod time;
pub mod vpd;

// Public API
pub use decision::{decide, Decision, DecisionEvidence, DecisionLabel, DecisionRecord, Trigger};
pub use dedup::{round_persisted, round_to, should_log};
pub use errors::{CoreError, CoreResult};
pub use freshness::{check_freshness, check_live, Freshness};
pub use health::{evaluate_health, Alert, HealthStatus, HealthVerdict};
pub use policy::{dynamic_threshold, PolicyConfig, VpdBand};
pub use reading::{HistoryWindow, LiveStatus, RawRecord, SensorReading};
pub use time::{FixedTime, RawTimestamp, SystemTime, TimeSource, Timestamp};
pub use vpd::vpd_kpa;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
