//! Start-up wiring
//!
//! Connect the store, load the model, build the service. A missing or
//! broken model is not fatal: the service starts anyway and answers
//! decision and diagnostics requests with `503` until it is restarted with
//! a usable model, while live status and history keep working.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use verdant_connectors::{RtdbConfig, RtdbConnector};
use verdant_ml::{LinearPredictor, Predictor};

use crate::config::ServiceConfig;
use crate::service::GardenService;

/// Realtime Database connector for the configured device
pub fn connect(config: &ServiceConfig) -> Result<RtdbConnector> {
    let mut rtdb = RtdbConfig::new(&config.database_url).device_path(&config.device_path);
    if let Some(token) = &config.auth_token {
        rtdb = rtdb.database_secret(token);
    }
    let connector = RtdbConnector::new(rtdb)
        .with_context(|| format!("connecting to {}", config.database_url))?;
    info!("connected to {}{}", config.database_url, config.device_path);
    Ok(connector)
}

/// Load the configured model, or `None` if it cannot be loaded
pub fn load_predictor(config: &ServiceConfig) -> Option<Arc<dyn Predictor>> {
    let path = config.model_path();
    match LinearPredictor::from_path(&path) {
        Ok(model) => Some(Arc::new(model)),
        Err(e) => {
            warn!("model unavailable, decisions disabled: {}", e);
            None
        }
    }
}

/// Validate `config` and build a service backed by the Realtime Database
pub fn build_service(config: ServiceConfig) -> Result<GardenService> {
    config.validate().context("invalid service configuration")?;

    let store = Arc::new(connect(&config)?);
    let predictor = load_predictor(&config);

    let service = GardenService::new(config, store);
    Ok(match predictor {
        Some(predictor) => service.with_predictor(predictor),
        None => service,
    })
}

/// [`build_service`] from process environment
pub fn from_env() -> Result<GardenService> {
    let config = ServiceConfig::from_env().context("reading configuration from environment")?;
    build_service(config)
}
