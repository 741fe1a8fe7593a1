//! Store connectors for Verdant
//!
//! ## Overview
//!
//! A greenhouse device keeps three nodes in its store:
//!
//! ```text
//! <device path>/
//! ├── live_status      latest snapshot, plus ai_* fields merged by the service
//! ├── history_logs     one record per upload, keyed by push id
//! └── decision_logs    decisions worth remembering, appended by the service
//! ```
//!
//! The service talks to them through three narrow traits, one per node, so
//! tests and alternative backends only implement what they need:
//!
//! | Trait               | Node            | Operations          |
//! |---------------------|-----------------|---------------------|
//! | [`HistoryStore`]    | `history_logs`  | `recent(limit)`     |
//! | [`LiveStateStore`]  | `live_status`   | `live()`, `merge()` |
//! | [`DecisionLogStore`]| `decision_logs` | `append()`          |
//!
//! Two backends ship here:
//!
//! - [`rtdb::RtdbConnector`] (feature `rtdb`, on by default): Firebase
//!   Realtime Database over its REST API, using a blocking `ureq` agent.
//! - [`memory::MemoryStore`]: a mutex-guarded in-process store for tests
//!   and local runs.
//!
//! Store calls are blocking. A decision cycle issues a handful of them in
//! sequence and the service runs each request on its own thread.
//!
//! ## Errors
//!
//! Every failure is a [`StoreError`]. An empty node is *not* an error:
//! `recent` returns an empty vector and `live` returns `None`, so callers
//! can tell "no data yet" apart from "the store is unreachable".
//!
//! ## Example Usage
//!
//! ```rust
//! use verdant_connectors::{HistoryStore, LiveStateStore, memory::MemoryStore};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! store.push_history(json!({ "timestamp": "2024-05-01 06:00:00", "soilPercent": 71 }));
//! store.set_live(json!({ "timestamp": "2024-05-01 06:00:00", "soilPercent": 71 }));
//!
//! assert_eq!(store.recent(20)?.len(), 1);
//! assert!(store.live()?.is_some());
//! # Ok::<(), verdant_connectors::StoreError>(())
//! ```

#![deny(unsafe_code)]

pub mod memory;

#[cfg(feature = "rtdb")]
pub mod rtdb;

#[cfg(feature = "rtdb")]
pub use rtdb::{AuthMethod, RtdbConfig, RtdbConnector};

use thiserror::Error;
use verdant_core::{DecisionRecord, LiveStatus, RawRecord};

/// Common store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or transport failure
    #[error("Request failed: {0}")]
    Request(String),

    /// Store answered with an error status
    #[error("Server error {status}: {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Connector misconfigured
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Read access to the sensor history
pub trait HistoryStore: Send + Sync {
    /// Up to `limit` most recent records, in key order (oldest first)
    fn recent(&self, limit: usize) -> Result<Vec<RawRecord>, StoreError>;
}

/// Read/merge access to the live-status node
pub trait LiveStateStore: Send + Sync {
    /// Current live status; `None` when the node is empty
    fn live(&self) -> Result<Option<LiveStatus>, StoreError>;

    /// Shallow-merge `update` into the live status, leaving other fields alone
    fn merge(&self, update: &DecisionRecord) -> Result<(), StoreError>;
}

/// Append-only decision log
pub trait DecisionLogStore: Send + Sync {
    /// Append one entry, returning the key the store assigned
    fn append(&self, entry: &DecisionRecord) -> Result<String, StoreError>;
}

/// Request statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConnectionStats {
    /// Requests that succeeded
    pub requests_ok: u64,
    /// Requests that failed after all retries
    pub requests_failed: u64,
    /// Retries issued
    pub retries: u64,
    /// Last error message
    pub last_error: Option<String>,
}
