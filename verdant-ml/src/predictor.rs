//! Predictor boundary
//!
//! The forecaster is a black box trained elsewhere. The service only needs
//! to know which features it consumes and to hand it one vector at a time.
//! [`LinearPredictor`] is the in-tree implementation; it loads a model file
//! of the form
//!
//! ```json
//! {
//!   "feature_names": ["VPD_kPa", "soil_moisture_frac", "sm_lag1"],
//!   "coefficients": [-0.012, 0.91, 0.07],
//!   "intercept": 0.004
//! }
//! ```
//!
//! `feature_names` is optional; without it the fallback schema
//! (`VPD_kPa`, `soil_moisture_frac`, `temperature_C`, `humidity_RH`) applies.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;
use thiserror_no_std::Error;

use crate::schema::{FeatureSchema, FeatureVector};

/// Errors from loading or running a predictor
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// Vector was derived for a different schema
    #[error("feature schema mismatch: model expects {expected}, got {actual}")]
    SchemaMismatch {
        /// Schema the model was loaded with
        expected: String,
        /// Schema of the offered vector
        actual: String,
    },

    /// Model produced NaN or infinity
    #[error("model produced a non-finite forecast")]
    NonFinite,

    /// Model file could not be read or parsed
    #[error("failed to load model: {0}")]
    Load(String),
}

/// Soil-moisture forecaster
pub trait Predictor: Send + Sync {
    /// Features the model consumes, in order
    fn schema(&self) -> &FeatureSchema;

    /// Forecast soil moisture (fraction) for one feature vector
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictError>;
}

#[derive(Debug, Deserialize)]
struct LinearModelFile {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    coefficients: Vec<f64>,
    #[serde(default)]
    intercept: f64,
}

/// Linear regression over the schema features, clamped to `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPredictor {
    schema: FeatureSchema,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearPredictor {
    /// Model from explicit parts
    pub fn new(
        schema: FeatureSchema,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> Result<Self, PredictError> {
        if coefficients.len() != schema.len() {
            return Err(PredictError::Load(format!(
                "{} coefficients for {} features",
                coefficients.len(),
                schema.len()
            )));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(PredictError::Load("non-finite model parameter".into()));
        }
        Ok(Self {
            schema,
            coefficients,
            intercept,
        })
    }

    /// Parse a model file's contents
    pub fn from_json_str(json: &str) -> Result<Self, PredictError> {
        let file: LinearModelFile =
            serde_json::from_str(json).map_err(|e| PredictError::Load(e.to_string()))?;

        let schema = match file.feature_names {
            Some(names) => FeatureSchema::new(names),
            None => {
                info!("model does not list its features, using fallback schema");
                FeatureSchema::fallback()
            }
        };
        Self::new(schema, file.coefficients, file.intercept)
    }

    /// Load a model file from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PredictError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| PredictError::Load(format!("{}: {}", path.display(), e)))?;
        let model = Self::from_json_str(&json)?;
        info!("loaded model {} with features {}", path.display(), model.schema);
        Ok(model)
    }
}

impl Predictor for LinearPredictor {
    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictError> {
        if features.schema() != &self.schema {
            return Err(PredictError::SchemaMismatch {
                expected: self.schema.to_string(),
                actual: features.schema().to_string(),
            });
        }

        let raw = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.values())
                .map(|(c, x)| c * x)
                .sum::<f64>();

        if !raw.is_finite() {
            return Err(PredictError::NonFinite);
        }
        debug!("linear forecast {:.4}", raw);
        Ok(raw.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vector(schema: &FeatureSchema, values: Vec<f64>) -> FeatureVector {
        FeatureVector::new(schema.clone(), values)
    }

    #[test]
    fn loads_feature_names_from_file() {
        let model = LinearPredictor::from_json_str(
            r#"{"feature_names": ["soil_moisture_frac", "sm_lag1"], "coefficients": [0.9, 0.1], "intercept": 0.01}"#,
        )
        .unwrap();

        assert_eq!(model.schema().names(), ["soil_moisture_frac", "sm_lag1"]);
        let forecast = model.predict(&vector(model.schema(), vec![0.7, 0.8])).unwrap();
        assert!((forecast - 0.72).abs() < 1e-9);
    }

    #[test]
    fn missing_names_use_fallback_schema() {
        let model =
            LinearPredictor::from_json_str(r#"{"coefficients": [0, 1, 0, 0]}"#).unwrap();
        assert_eq!(model.schema(), &FeatureSchema::fallback());
    }

    #[test]
    fn coefficient_count_must_match() {
        let err = LinearPredictor::from_json_str(r#"{"coefficients": [1.0]}"#).unwrap_err();
        assert!(matches!(err, PredictError::Load(_)));
    }

    #[test]
    fn output_is_clamped() {
        let schema = FeatureSchema::new(["x"]);
        let model = LinearPredictor::new(schema.clone(), vec![2.0], 0.0).unwrap();
        assert_eq!(model.predict(&vector(&schema, vec![1.0])), Ok(1.0));
        assert_eq!(model.predict(&vector(&schema, vec![-1.0])), Ok(0.0));
    }

    #[test]
    fn foreign_schema_rejected() {
        let model = LinearPredictor::new(FeatureSchema::new(["x"]), vec![1.0], 0.0).unwrap();
        let other = FeatureSchema::new(["y"]);
        assert!(matches!(
            model.predict(&vector(&other, vec![1.0])),
            Err(PredictError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn non_finite_input_reported() {
        let schema = FeatureSchema::new(["x"]);
        let model = LinearPredictor::new(schema.clone(), vec![1.0], 0.0).unwrap();
        assert_eq!(
            model.predict(&vector(&schema, vec![f64::NAN])),
            Err(PredictError::NonFinite)
        );
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"feature_names": ["x"], "coefficients": [0.5]}}"#).unwrap();

        let model = LinearPredictor::from_path(file.path()).unwrap();
        assert_eq!(model.schema().len(), 1);

        let missing = LinearPredictor::from_path(file.path().with_extension("nope"));
        assert!(matches!(missing, Err(PredictError::Load(_))));
    }
}
