//! Request failures
//!
//! Degraded device states (offline, still collecting history) are normal
//! responses and never appear here. A `ServiceError` means the request
//! itself could not be served:
//!
//! ```text
//! PredictorUnavailable        → 503  model never loaded, fail fast
//! Store / Prediction / Core   → 500  upstream fault, message attached
//! ```

use thiserror::Error;
use verdant_connectors::StoreError;
use verdant_core::CoreError;
use verdant_ml::PredictError;

/// Why a request failed
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No model was loaded at start-up
    #[error("AI Model service not initialized")]
    PredictorUnavailable,

    /// Store unreachable or returned garbage
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// Model rejected the feature vector
    #[error("prediction failed: {0}")]
    Prediction(#[from] PredictError),

    /// History could not be shaped into features
    #[error("feature derivation failed: {0}")]
    Core(#[from] CoreError),
}

impl ServiceError {
    /// HTTP-style status for whatever server fronts the service
    pub fn status_code(&self) -> u16 {
        match self {
            Self::PredictorUnavailable => 503,
            Self::Store(_) | Self::Prediction(_) | Self::Core(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::PredictorUnavailable.status_code(), 503);
        assert_eq!(
            ServiceError::from(StoreError::Request("timeout".into())).status_code(),
            500
        );
        assert_eq!(ServiceError::from(PredictError::NonFinite).status_code(), 500);
        assert_eq!(ServiceError::from(CoreError::EmptyWindow).status_code(), 500);
    }

    #[test]
    fn test_underlying_message_attached() {
        let err = ServiceError::from(StoreError::Server {
            status: 401,
            message: "Permission denied".into(),
        });
        assert!(err.to_string().contains("Permission denied"));
    }
}
