//! The four request handlers
//!
//! Every diagnostics or decision request runs one cycle:
//!
//! ```text
//! predictor loaded? ──no──▶ 503
//!        │
//! fetch history (window) + live status
//!        │
//! live fresh? ──no──▶ OFFLINE
//!        │
//! history ≥ min? ──no──▶ WAITING_DATA / WAIT_DATA
//!        │
//! features ─▶ forecast ─▶ health verdict | decision ─▶ merge live, maybe append log
//! ```
//!
//! Handlers share nothing mutable. Two requests racing on the same device
//! may both log the same decision, or both skip it; the log is best-effort.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use verdant_connectors::{DecisionLogStore, HistoryStore, LiveStateStore};
use verdant_core::time::format_wall_clock;
use verdant_core::{
    check_live, decide, evaluate_health, should_log, vpd_kpa, Decision, LiveStatus, RawRecord,
    SystemTime, TimeSource,
};
use verdant_ml::{derive_from_records, Predictor};

use crate::config::ServiceConfig;
use crate::dto::{DecisionResponse, DiagnosticsResponse, LiveStatusResponse, OfflineStatus};
use crate::error::ServiceError;

/// Default number of records returned by [`GardenService::history`]
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Values assumed when the live node lacks a field
mod live_defaults {
    pub const TEMPERATURE_C: f64 = 25.0;
    pub const HUMIDITY_RH: f64 = 70.0;
    pub const SOIL_PERCENT: f64 = 0.0;
}

/// Inputs of an evaluated cycle
struct Observation {
    live: LiveStatus,
    forecast: f64,
}

impl Observation {
    fn soil_frac(&self) -> f64 {
        self.live.soil_percent().unwrap_or(live_defaults::SOIL_PERCENT) / 100.0
    }
}

enum Cycle {
    Offline,
    Waiting,
    Evaluated(Observation),
}

/// Greenhouse request handlers over a store, a predictor and a clock
pub struct GardenService {
    config: Arc<ServiceConfig>,
    history: Arc<dyn HistoryStore>,
    live: Arc<dyn LiveStateStore>,
    decisions: Arc<dyn DecisionLogStore>,
    predictor: Option<Arc<dyn Predictor>>,
    clock: Arc<dyn TimeSource>,
}

impl fmt::Debug for GardenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GardenService")
            .field("database_url", &self.config.database_url)
            .field("device_path", &self.config.device_path)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

impl GardenService {
    /// Service over one store that holds all three nodes
    pub fn new<S>(config: ServiceConfig, store: Arc<S>) -> Self
    where
        S: HistoryStore + LiveStateStore + DecisionLogStore + 'static,
    {
        Self::with_stores(config, store.clone(), store.clone(), store)
    }

    /// Service over separate stores
    pub fn with_stores(
        config: ServiceConfig,
        history: Arc<dyn HistoryStore>,
        live: Arc<dyn LiveStateStore>,
        decisions: Arc<dyn DecisionLogStore>,
    ) -> Self {
        let clock = Arc::new(SystemTime::with_offset_secs(config.utc_offset_secs));
        Self {
            config: Arc::new(config),
            history,
            live,
            decisions,
            predictor: None,
            clock,
        }
    }

    /// Attach the forecaster
    pub fn with_predictor(mut self, predictor: Arc<dyn Predictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Whether decision and diagnostics requests can be served
    pub fn is_ready(&self) -> bool {
        self.predictor.is_some()
    }

    /// Latest snapshot, or an offline marker when the device is stale
    pub fn live_status(&self) -> Result<LiveStatusResponse, ServiceError> {
        let live = self.live.live()?;
        let freshness = check_live(live.as_ref(), self.clock.as_ref());

        match live {
            Some(snapshot) if freshness.is_fresh => Ok(LiveStatusResponse::Online(snapshot)),
            _ => {
                warn!("device offline (age {:?} s)", freshness.age_secs);
                Ok(LiveStatusResponse::Offline(OfflineStatus::from_freshness(&freshness)))
            }
        }
    }

    /// Most recent `limit` history records, oldest first
    ///
    /// An empty vector means the device has not uploaded anything yet.
    pub fn history(&self, limit: usize) -> Result<Vec<RawRecord>, ServiceError> {
        Ok(self.history.recent(limit)?)
    }

    /// Cross-check the live reading against the forecast
    pub fn diagnostics(&self) -> Result<DiagnosticsResponse, ServiceError> {
        let observation = match self.run_cycle()? {
            Cycle::Offline => return Ok(DiagnosticsResponse::offline()),
            Cycle::Waiting => return Ok(DiagnosticsResponse::waiting_for_data()),
            Cycle::Evaluated(observation) => observation,
        };

        let current = observation.soil_frac();
        let verdict = evaluate_health(current, observation.live.pump_on(), observation.forecast);
        if verdict.has_alerts() {
            warn!("health {}: {:?}", verdict.status, verdict.alerts);
        }

        Ok(DiagnosticsResponse::evaluated(
            &verdict,
            observation.forecast,
            current,
            format_wall_clock(self.clock.now()),
        ))
    }

    /// Decide whether to irrigate, persisting the outcome
    ///
    /// The live node is updated on every evaluated cycle; the decision log
    /// only when the label or the 3-decimal forecast changed.
    pub fn irrigation_decision(&self) -> Result<DecisionResponse, ServiceError> {
        let observation = match self.run_cycle()? {
            Cycle::Offline => return Ok(DecisionResponse::from(&Decision::offline())),
            Cycle::Waiting => return Ok(DecisionResponse::from(&Decision::waiting_for_data())),
            Cycle::Evaluated(observation) => observation,
        };

        let live = &observation.live;
        let vpd = vpd_kpa(
            Some(live.temperature().unwrap_or(live_defaults::TEMPERATURE_C)),
            Some(live.humidity().unwrap_or(live_defaults::HUMIDITY_RH)),
        );
        let decision = decide(observation.forecast, observation.soil_frac(), vpd, &self.config.policy);

        if let Some(record) = decision.live_update(self.clock.now()) {
            self.live.merge(&record)?;

            if should_log(
                record.ai_last_decision.as_str(),
                record.ai_forecast_soil,
                live.previous_decision(),
                live.previous_forecast(),
            ) {
                let key = self.decisions.append(&record)?;
                info!(
                    "logged {} (forecast {:.3}) as {}",
                    record.ai_last_decision, record.ai_forecast_soil, key
                );
            } else {
                debug!(
                    "{} unchanged at forecast {:.3}, not logged",
                    record.ai_last_decision, record.ai_forecast_soil
                );
            }
        }

        Ok(DecisionResponse::from(&decision))
    }

    fn run_cycle(&self) -> Result<Cycle, ServiceError> {
        let Some(predictor) = self.predictor.as_ref() else {
            warn!("request refused: no model loaded");
            return Err(ServiceError::PredictorUnavailable);
        };

        let records = self.history.recent(self.config.history_window)?;
        let live = self.live.live()?;

        let freshness = check_live(live.as_ref(), self.clock.as_ref());
        let live = match live {
            Some(live) if freshness.is_fresh => live,
            _ => {
                warn!("device offline (age {:?} s), skipping forecast", freshness.age_secs);
                return Ok(Cycle::Offline);
            }
        };

        if records.len() < self.config.min_history {
            debug!(
                "{} history records, need {}",
                records.len(),
                self.config.min_history
            );
            return Ok(Cycle::Waiting);
        }

        let features = derive_from_records(&records, predictor.schema(), self.clock.offset())?;
        debug!("features {:?}", features.iter().collect::<Vec<_>>());

        let forecast = predictor.predict(&features)?;
        Ok(Cycle::Evaluated(Observation { live, forecast }))
    }
}
