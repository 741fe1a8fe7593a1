//! Service configuration
//!
//! Loaded once at start-up, validated, then shared immutably behind an
//! `Arc` by every request.

use std::path::PathBuf;

use chrono::FixedOffset;
use thiserror::Error;
use verdant_core::constants::{DEFAULT_HISTORY_WINDOW, MIN_HISTORY_LEN};
use verdant_core::{CoreError, PolicyConfig};

/// Model file used when `MODEL_NAME` is not set
pub const DEFAULT_MODEL_NAME: &str = "soil_model_v1.json";

/// Configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Required variable not set
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    /// Variable set but unusable
    #[error("Invalid value for {key}: {value:?}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Value as given
        value: String,
    },

    /// Policy thresholds inconsistent
    #[error("Invalid policy: {0}")]
    Policy(#[from] CoreError),
}

/// Everything the service needs to start
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Realtime Database URL
    pub database_url: String,
    /// Database secret or ID token
    pub auth_token: Option<String>,
    /// Device node, e.g. `/sensors/greenhouse_1`
    pub device_path: String,
    /// Directory holding model files
    pub model_dir: PathBuf,
    /// Model file name inside `model_dir`
    pub model_name: String,
    /// History records fetched per cycle
    pub history_window: usize,
    /// Fewer records than this means "still collecting"
    pub min_history: usize,
    /// Device wall-clock offset from UTC, seconds
    pub utc_offset_secs: i32,
    /// Irrigation policy
    pub policy: PolicyConfig,
}

impl ServiceConfig {
    /// Configuration for a database with defaults for everything else
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            auth_token: None,
            device_path: "/sensors/greenhouse_1".to_string(),
            model_dir: PathBuf::from("models"),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
            min_history: MIN_HISTORY_LEN,
            utc_offset_secs: 0,
            policy: PolicyConfig::default(),
        }
    }

    /// Read from process environment
    ///
    /// | Variable                 | Default              |
    /// |--------------------------|----------------------|
    /// | `FIREBASE_DB_URL`        | required             |
    /// | `FIREBASE_AUTH_TOKEN`    | none                 |
    /// | `DEVICE_PATH`            | `/sensors/greenhouse_1` |
    /// | `MODEL_DIR`              | `models`             |
    /// | `MODEL_NAME`             | `soil_model_v1.json` |
    /// | `DEVICE_UTC_OFFSET_SECS` | `0`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("FIREBASE_DB_URL").ok_or(ConfigError::Missing("FIREBASE_DB_URL"))?;
        let mut config = Self::new(database_url);

        config.auth_token = get("FIREBASE_AUTH_TOKEN");
        if let Some(path) = get("DEVICE_PATH") {
            config.device_path = path;
        }
        if let Some(dir) = get("MODEL_DIR") {
            config.model_dir = PathBuf::from(dir);
        }
        if let Some(name) = get("MODEL_NAME") {
            config.model_name = name;
        }
        if let Some(offset) = get("DEVICE_UTC_OFFSET_SECS") {
            config.utc_offset_secs = offset.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "DEVICE_UTC_OFFSET_SECS",
                value: offset.clone(),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the policy
    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Set the history window and minimum
    pub fn with_history(mut self, window: usize, min: usize) -> Self {
        self.history_window = window;
        self.min_history = min;
        self
    }

    /// Set the device's UTC offset
    pub fn with_utc_offset_secs(mut self, secs: i32) -> Self {
        self.utc_offset_secs = secs;
        self
    }

    /// Full path of the model file
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_name)
    }

    /// Device offset as a chrono offset
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_secs).ok_or_else(|| ConfigError::Invalid {
            key: "DEVICE_UTC_OFFSET_SECS",
            value: self.utc_offset_secs.to_string(),
        })
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Missing("FIREBASE_DB_URL"));
        }
        if self.history_window == 0 || self.min_history == 0 || self.min_history > self.history_window {
            return Err(ConfigError::Invalid {
                key: "history_window",
                value: format!("window {} / min {}", self.history_window, self.min_history),
            });
        }
        self.utc_offset()?;
        self.policy.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_database_url_required() {
        assert_eq!(
            ServiceConfig::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("FIREBASE_DB_URL")
        );
        assert_eq!(
            ServiceConfig::from_lookup(lookup(&[("FIREBASE_DB_URL", "  ")])).unwrap_err(),
            ConfigError::Missing("FIREBASE_DB_URL")
        );
    }

    #[test]
    fn test_defaults() {
        let config =
            ServiceConfig::from_lookup(lookup(&[("FIREBASE_DB_URL", "https://g.firebaseio.com")]))
                .unwrap();

        assert_eq!(config.device_path, "/sensors/greenhouse_1");
        assert_eq!(config.model_path(), PathBuf::from("models/soil_model_v1.json"));
        assert_eq!(config.history_window, 60);
        assert_eq!(config.min_history, 10);
        assert_eq!(config.auth_token, None);
        assert_eq!(config.policy, PolicyConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("FIREBASE_DB_URL", "https://g.firebaseio.com"),
            ("FIREBASE_AUTH_TOKEN", "tok"),
            ("DEVICE_PATH", "/sensors/bed_2"),
            ("MODEL_DIR", "/opt/models"),
            ("MODEL_NAME", "v2.json"),
            ("DEVICE_UTC_OFFSET_SECS", "25200"),
        ]))
        .unwrap();

        assert_eq!(config.auth_token.as_deref(), Some("tok"));
        assert_eq!(config.device_path, "/sensors/bed_2");
        assert_eq!(config.model_path(), PathBuf::from("/opt/models/v2.json"));
        assert_eq!(config.utc_offset().unwrap().local_minus_utc(), 25200);
    }

    #[test]
    fn test_bad_offset_rejected() {
        let err = ServiceConfig::from_lookup(lookup(&[
            ("FIREBASE_DB_URL", "https://g.firebaseio.com"),
            ("DEVICE_UTC_OFFSET_SECS", "+7h"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DEVICE_UTC_OFFSET_SECS", .. }));

        let out_of_range = ServiceConfig::new("https://g").with_utc_offset_secs(90_000);
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn test_history_bounds_checked() {
        let config = ServiceConfig::new("https://g").with_history(5, 10);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_policy_checked() {
        let config = ServiceConfig::new("https://g")
            .with_policy(PolicyConfig::default().with_thresholds(0.8, 0.7, 0.6));
        assert!(matches!(config.validate(), Err(ConfigError::Policy(_))));
    }
}
