//! Feature schema and feature vectors
//!
//! A [`FeatureSchema`] is the ordered list of column names a trained model
//! consumes. It is fixed when the model loads and shared (cheaply cloned)
//! between the predictor and every vector derived for it.

use std::fmt;
use std::sync::Arc;

use crate::names;

/// Ordered feature names a model expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Arc<[String]>,
}

impl FeatureSchema {
    /// Schema from names, in model order
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Schema used when a model file does not list its own features
    pub fn fallback() -> Self {
        Self::new([
            names::VPD,
            names::SOIL_MOISTURE,
            names::TEMPERATURE,
            names::HUMIDITY,
        ])
    }

    /// Names, in model order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True for a schema with no features
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a feature
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names.join(", "))
    }
}

/// One value per schema feature, in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: FeatureSchema,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Pair a schema with its values
    ///
    /// Callers in this crate guarantee `values.len() == schema.len()`.
    pub(crate) fn new(schema: FeatureSchema, values: Vec<f64>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self { schema, values }
    }

    /// Schema the vector was derived for
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Values, in schema order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value of one feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.position(name).map(|i| self.values[i])
    }

    /// `(name, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_schema_order() {
        let schema = FeatureSchema::fallback();
        assert_eq!(
            schema.names(),
            ["VPD_kPa", "soil_moisture_frac", "temperature_C", "humidity_RH"]
        );
        assert_eq!(schema.position("temperature_C"), Some(2));
        assert_eq!(schema.position("hour"), None);
    }

    #[test]
    fn vector_lookup_by_name() {
        let schema = FeatureSchema::new(["a", "b"]);
        let vector = FeatureVector::new(schema, vec![1.0, 2.0]);

        assert_eq!(vector.get("b"), Some(2.0));
        assert_eq!(vector.get("c"), None);
        assert_eq!(vector.iter().collect::<Vec<_>>(), vec![("a", 1.0), ("b", 2.0)]);
    }

    #[test]
    fn display_lists_names() {
        assert_eq!(FeatureSchema::new(["x", "y"]).to_string(), "[x, y]");
    }
}
