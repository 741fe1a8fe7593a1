//! Firebase Realtime Database connector - REST API over ureq
//!
//! ## Overview
//!
//! Every database node is addressable as `<base_url><path>.json`, so the
//! three device nodes map onto four plain HTTP calls:
//!
//! | Operation        | Request                                                          |
//! |------------------|------------------------------------------------------------------|
//! | `live()`         | `GET   <device>/live_status.json`                                |
//! | `merge()`        | `PATCH <device>/live_status.json`                                |
//! | `recent(n)`      | `GET   <device>/history_logs.json?orderBy="$key"&limitToLast=n`  |
//! | `append()`       | `POST  <device>/decision_logs.json` → `{"name": "<push id>"}`    |
//!
//! An empty node reads back as `null`.
//!
//! ## Retries
//!
//! Transport failures, `429` and `5xx` are retried with exponential backoff
//! (100 ms, 200 ms, 400 ms, ...). `POST` is never retried: the store may
//! have accepted the first attempt, and a duplicate decision-log entry is
//! worse than a missing one.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use verdant_connectors::rtdb::{RtdbConfig, RtdbConnector};
//! use verdant_connectors::LiveStateStore;
//!
//! let config = RtdbConfig::new("https://my-garden.firebaseio.com")
//!     .device_path("/sensors/greenhouse_1")
//!     .database_secret("secret")
//!     .timeout_secs(10);
//!
//! let rtdb = RtdbConnector::new(config)?;
//! if let Some(live) = rtdb.live()? {
//!     println!("soil: {:?}%", live.soil_percent());
//! }
//! # Ok::<(), verdant_connectors::StoreError>(())
//! ```

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use verdant_core::{DecisionRecord, LiveStatus, RawRecord};

use crate::{ConnectionStats, DecisionLogStore, HistoryStore, LiveStateStore, StoreError};

/// Default device node
pub const DEFAULT_DEVICE_PATH: &str = "/sensors/greenhouse_1";

const LIVE_NODE: &str = "live_status";
const HISTORY_NODE: &str = "history_logs";
const DECISION_NODE: &str = "decision_logs";

/// Authentication methods
#[derive(Clone, PartialEq)]
pub enum AuthMethod {
    /// Public or rules-open database
    None,
    /// Legacy database secret or ID token, sent as `?auth=`
    DatabaseSecret(String),
    /// OAuth2 access token, sent as `Authorization: Bearer`
    Bearer(String),
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::DatabaseSecret(_) => f.write_str("DatabaseSecret(..)"),
            Self::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}

/// Connector configuration
#[derive(Debug, Clone)]
pub struct RtdbConfig {
    /// Database URL, e.g. `https://<project>.firebaseio.com`
    pub base_url: String,
    /// Device node under the root, e.g. `/sensors/greenhouse_1`
    pub device_path: String,
    /// Authentication method
    pub auth: AuthMethod,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// User agent string
    pub user_agent: String,
}

impl RtdbConfig {
    /// Configuration for a database URL with defaults for everything else
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            device_path: DEFAULT_DEVICE_PATH.to_string(),
            auth: AuthMethod::None,
            timeout: Duration::from_secs(10),
            max_retries: 2,
            user_agent: format!("Verdant/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the device node
    pub fn device_path(mut self, path: impl Into<String>) -> Self {
        self.device_path = path.into();
        self
    }

    /// Authenticate with a database secret or ID token
    pub fn database_secret(mut self, secret: impl Into<String>) -> Self {
        self.auth = AuthMethod::DatabaseSecret(secret.into());
        self
    }

    /// Authenticate with an OAuth2 access token
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::Bearer(token.into());
        self
    }

    /// Set request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Set retry count
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// Realtime Database connector using a blocking ureq agent
pub struct RtdbConnector {
    base_url: String,
    device_path: String,
    config: RtdbConfig,
    agent: ureq::Agent,
    stats: Mutex<ConnectionStats>,
}

impl RtdbConnector {
    /// Validate the configuration and build the agent
    pub fn new(config: RtdbConfig) -> Result<Self, StoreError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(StoreError::Config(
                "Database URL must start with http:// or https://".into(),
            ));
        }

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let trimmed = config.device_path.trim_matches('/');
        let device_path = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        };

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self {
            base_url,
            device_path,
            config,
            agent,
            stats: Mutex::new(ConnectionStats::default()),
        })
    }

    /// Request statistics so far
    pub fn stats(&self) -> ConnectionStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// URL of a node under the device path
    pub fn node_url(&self, node: &str) -> String {
        format!("{}{}/{}.json", self.base_url, self.device_path, node)
    }

    fn request(&self, method: &str, node: &str) -> ureq::Request {
        let mut request = self
            .agent
            .request(method, &self.node_url(node))
            .set("Accept", "application/json");

        match &self.config.auth {
            AuthMethod::None => {}
            AuthMethod::DatabaseSecret(secret) => request = request.query("auth", secret),
            AuthMethod::Bearer(token) => {
                request = request.set("Authorization", &format!("Bearer {}", token))
            }
        }
        request
    }

    fn record<F: FnOnce(&mut ConnectionStats)>(&self, f: F) {
        f(&mut self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Execute with retry; `body` is sent as JSON when present
    fn execute(
        &self,
        request: ureq::Request,
        body: Option<&str>,
        retryable: bool,
    ) -> Result<Value, StoreError> {
        let attempts = if retryable { self.config.max_retries + 1 } else { 1 };
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                thread::sleep(Duration::from_millis(100 * (1 << (attempt - 1))));
                self.record(|s| s.retries += 1);
            }

            let response = match body {
                None => request.clone().call(),
                Some(json) => request
                    .clone()
                    .set("Content-Type", "application/json")
                    .send_string(json),
            };

            match response {
                Ok(resp) => {
                    let text = resp
                        .into_string()
                        .map_err(|e| StoreError::Request(e.to_string()))?;
                    self.record(|s| s.requests_ok += 1);

                    if text.trim().is_empty() {
                        return Ok(Value::Null);
                    }
                    return Ok(serde_json::from_str(&text)?);
                }
                Err(ureq::Error::Status(code, resp)) => {
                    let err = StoreError::Server {
                        status: code,
                        message: resp.into_string().unwrap_or_default(),
                    };
                    if code >= 500 || code == 429 {
                        warn!("{} {}: {} (attempt {})", request.method(), request.url(), err, attempt + 1);
                        last_error = Some(err);
                        continue;
                    }
                    self.record(|s| {
                        s.requests_failed += 1;
                        s.last_error = Some(err.to_string());
                    });
                    return Err(err);
                }
                Err(ureq::Error::Transport(e)) => {
                    warn!("{} {}: {} (attempt {})", request.method(), request.url(), e, attempt + 1);
                    last_error = Some(StoreError::Request(e.to_string()));
                }
            }
        }

        let err = last_error.unwrap_or_else(|| StoreError::Request("Unknown error".into()));
        self.record(|s| {
            s.requests_failed += 1;
            s.last_error = Some(err.to_string());
        });
        Err(err)
    }
}

/// Turn a `history_logs` snapshot into records, oldest key first
///
/// The database returns an object keyed by push id, `null` for an empty
/// node, or an array when every key happens to be a small integer.
pub fn records_from_snapshot(snapshot: Value) -> Result<Vec<RawRecord>, StoreError> {
    match snapshot {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => {
            let mut records: Vec<RawRecord> = map
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| RawRecord::from_value(Some(k), v))
                .collect();
            records.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(records)
        }
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| RawRecord::from_value(Some(i.to_string()), v))
            .collect()),
        other => Err(StoreError::Serialization(format!(
            "unexpected history snapshot: {}",
            other
        ))),
    }
}

/// Body of a `POST` response
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// Push id from a `POST` response (`{"name": "-N..."}`)
pub fn push_id_from_response(response: &Value) -> Result<String, StoreError> {
    PushResponse::deserialize(response)
        .map(|push| push.name)
        .map_err(|e| StoreError::Serialization(format!("missing push id in {}: {}", response, e)))
}

impl HistoryStore for RtdbConnector {
    fn recent(&self, limit: usize) -> Result<Vec<RawRecord>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let request = self
            .request("GET", HISTORY_NODE)
            .query("orderBy", "\"$key\"")
            .query("limitToLast", &limit.to_string());

        let records = records_from_snapshot(self.execute(request, None, true)?)?;
        debug!("fetched {} history records (limit {})", records.len(), limit);
        Ok(records)
    }
}

impl LiveStateStore for RtdbConnector {
    fn live(&self) -> Result<Option<LiveStatus>, StoreError> {
        let value = self.execute(self.request("GET", LIVE_NODE), None, true)?;
        Ok(LiveStatus::from_value(value))
    }

    fn merge(&self, update: &DecisionRecord) -> Result<(), StoreError> {
        let body = serde_json::to_string(update)?;
        // PATCH is idempotent, safe to retry
        self.execute(self.request("PATCH", LIVE_NODE), Some(&body), true)?;
        debug!("merged {} into live status", update.ai_last_decision);
        Ok(())
    }
}

impl DecisionLogStore for RtdbConnector {
    fn append(&self, entry: &DecisionRecord) -> Result<String, StoreError> {
        let body = serde_json::to_string(entry)?;
        let response = self.execute(self.request("POST", DECISION_NODE), Some(&body), false)?;
        let key = push_id_from_response(&response)?;
        debug!("appended decision log entry {}", key);
        Ok(key)
    }
}
