//! Verdant request handlers
//!
//! The four queries a greenhouse dashboard makes, independent of any HTTP
//! framework:
//!
//! | Handler                                    | Returns                                   |
//! |--------------------------------------------|-------------------------------------------|
//! | [`GardenService::live_status`]             | snapshot, or `OFFLINE` marker             |
//! | [`GardenService::history`]                 | recent records with their `id`            |
//! | [`GardenService::diagnostics`]             | health verdict, alerts, deviation         |
//! | [`GardenService::irrigation_decision`]     | `IRRIGATE` / `WAIT` plus rationale        |
//!
//! Degraded device states come back as ordinary responses. Only
//! infrastructure failures are errors, and [`ServiceError::status_code`]
//! says how to report them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! let service = verdant_service::bootstrap::from_env()?;
//! let decision = service.irrigation_decision()?;
//! println!("{}", serde_json::to_string(&decision)?);
//! # Ok::<(), anyhow::Error>(())
//! ```

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod config;
pub mod dto;
pub mod error;
pub mod service;

pub use config::{ConfigError, ServiceConfig};
pub use dto::{DecisionResponse, DiagnosticsResponse, LiveStatusResponse, OfflineStatus};
pub use error::ServiceError;
pub use service::{GardenService, DEFAULT_HISTORY_LIMIT};
