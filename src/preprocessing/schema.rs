//! Model input schema
//!
//! The regressor was fit on a fixed column order: the numeric inputs in
//! [`NUMERIC_FEATURES`] order, then every one-hot column in the encoder's own
//! output order. [`FeatureSchema`] is the single source of that order; the
//! assembler builds vectors from it and the model is checked against it at
//! startup.

use crate::error::{Result, VgSalesError};
use serde::{Deserialize, Serialize};

use super::OneHotEncoder;

/// Numeric inputs, in model column order
pub const NUMERIC_FEATURES: [&str; 3] = ["year_of_release", "user_score", "critic_score"];

/// Categorical inputs, in encoder fit order
pub const CATEGORICAL_FEATURES: [&str; 5] = [
    "platform",
    "genre",
    "rating_esrb",
    "gen_platform",
    "classification_user_score",
];

/// Numeric part of a prediction request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericFields {
    pub year_of_release: i32,
    pub user_score: f64,
    pub critic_score: f64,
}

impl NumericFields {
    /// Values in [`NUMERIC_FEATURES`] order
    pub fn values(&self) -> [f64; 3] {
        [self.year_of_release as f64, self.user_score, self.critic_score]
    }
}

/// Categorical part of a prediction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalFields {
    pub platform: String,
    pub genre: String,
    pub rating_esrb: String,
    pub gen_platform: String,
    pub classification_user_score: String,
}

impl CategoricalFields {
    /// Look up a field by its encoder feature name.
    pub fn get(&self, feature: &str) -> Option<&str> {
        match feature {
            "platform" => Some(&self.platform),
            "genre" => Some(&self.genre),
            "rating_esrb" => Some(&self.rating_esrb),
            "gen_platform" => Some(&self.gen_platform),
            "classification_user_score" => Some(&self.classification_user_score),
            _ => None,
        }
    }

    /// `(feature, value)` pairs in [`CATEGORICAL_FEATURES`] order
    pub fn pairs(&self) -> [(&'static str, &str); 5] {
        [
            (CATEGORICAL_FEATURES[0], &self.platform),
            (CATEGORICAL_FEATURES[1], &self.genre),
            (CATEGORICAL_FEATURES[2], &self.rating_esrb),
            (CATEGORICAL_FEATURES[3], &self.gen_platform),
            (CATEGORICAL_FEATURES[4], &self.classification_user_score),
        ]
    }
}

/// LightGBM replaces whitespace in feature names with underscores.
pub fn normalize_feature_name(name: &str) -> String {
    name.chars().map(|c| if c.is_whitespace() { '_' } else { c }).collect()
}

/// Ordered list of model input columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn from_encoder(encoder: &OneHotEncoder) -> Self {
        let names = NUMERIC_FEATURES
            .iter()
            .map(|s| s.to_string())
            .chain(encoder.feature_names_out().iter().cloned())
            .collect();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn onehot_len(&self) -> usize {
        self.names.len() - NUMERIC_FEATURES.len()
    }

    /// Check that a model's feature names follow this schema exactly.
    pub fn check_model_features(&self, model_features: &[String]) -> Result<()> {
        if model_features.len() != self.names.len() {
            return Err(VgSalesError::DataUnavailable(format!(
                "model expects {} features, schema has {}",
                model_features.len(),
                self.names.len()
            )));
        }
        for (i, (expected, actual)) in self.names.iter().zip(model_features).enumerate() {
            if normalize_feature_name(expected) != normalize_feature_name(actual) {
                return Err(VgSalesError::DataUnavailable(format!(
                    "feature {} mismatch: schema has {:?}, model has {:?}",
                    i, expected, actual
                )));
            }
        }
        Ok(())
    }
}
