//! One-hot encoding of the categorical request fields
//!
//! The vocabulary comes from an encoder fitted offline and exported as JSON.
//! Output columns are named `<feature>_<category>`, feature-major in fit
//! order, categories in their fitted order.

use crate::error::{Result, VgSalesError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

use super::schema::{CategoricalFields, CATEGORICAL_FEATURES};

/// What to do with a value outside the fitted vocabulary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPolicy {
    /// Emit an all-zero block for the feature
    #[default]
    Ignore,
    /// Fail with [`VgSalesError::Encoding`]
    Error,
}

/// Serialized form of a fitted encoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderArtifact {
    pub feature_names_in: Vec<String>,
    pub categories: Vec<Vec<String>>,
    #[serde(default)]
    pub handle_unknown: UnknownPolicy,
}

/// A categorical value the encoder has never seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownCategory {
    pub feature: String,
    pub value: String,
}

impl std::fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.feature, self.value)
    }
}

/// Output of [`OneHotEncoder::encode`]
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedColumns {
    /// 0/1 indicators in [`OneHotEncoder::feature_names_out`] order
    pub values: Vec<f64>,
    /// Values that fell outside the vocabulary (ignore policy only)
    pub unknown: Vec<UnknownCategory>,
}

impl EncodedColumns {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Fitted one-hot encoder over the five categorical inputs
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    artifact: EncoderArtifact,
    /// Per feature: category -> position inside the feature block
    index: Vec<HashMap<String, usize>>,
    /// Start of each feature block in the output
    offsets: Vec<usize>,
    feature_names_out: Vec<String>,
}

impl OneHotEncoder {
    /// Validate a fitted vocabulary and build the lookup tables.
    pub fn from_artifact(artifact: EncoderArtifact) -> Result<Self> {
        if artifact.feature_names_in != CATEGORICAL_FEATURES {
            return Err(VgSalesError::DataUnavailable(format!(
                "encoder was fitted on {:?}, expected {:?}",
                artifact.feature_names_in, CATEGORICAL_FEATURES
            )));
        }
        if artifact.categories.len() != artifact.feature_names_in.len() {
            return Err(VgSalesError::DataUnavailable(format!(
                "encoder has {} category lists for {} features",
                artifact.categories.len(),
                artifact.feature_names_in.len()
            )));
        }

        let mut index = Vec::with_capacity(artifact.categories.len());
        let mut offsets = Vec::with_capacity(artifact.categories.len());
        let mut feature_names_out = Vec::new();

        for (feature, categories) in artifact.feature_names_in.iter().zip(&artifact.categories) {
            if categories.is_empty() {
                return Err(VgSalesError::DataUnavailable(format!(
                    "encoder has no categories for {}",
                    feature
                )));
            }
            let mut seen = HashSet::new();
            let mut lookup = HashMap::with_capacity(categories.len());
            offsets.push(feature_names_out.len());
            for (pos, category) in categories.iter().enumerate() {
                if !seen.insert(category.as_str()) {
                    return Err(VgSalesError::DataUnavailable(format!(
                        "duplicate category {:?} for {}",
                        category, feature
                    )));
                }
                lookup.insert(category.clone(), pos);
                feature_names_out.push(format!("{}_{}", feature, category));
            }
            index.push(lookup);
        }

        debug!(
            features = artifact.feature_names_in.len(),
            columns = feature_names_out.len(),
            policy = ?artifact.handle_unknown,
            "One-hot encoder ready"
        );

        Ok(Self {
            artifact,
            index,
            offsets,
            feature_names_out,
        })
    }

    /// Load a JSON encoder artifact.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|e| VgSalesError::unavailable(&shown, e))?;
        let artifact: EncoderArtifact =
            serde_json::from_str(&json).map_err(|e| VgSalesError::unavailable(&shown, e))?;
        Self::from_artifact(artifact).map_err(|e| VgSalesError::unavailable(&shown, e))
    }

    pub fn policy(&self) -> UnknownPolicy {
        self.artifact.handle_unknown
    }

    /// Names of the output columns, in output order
    pub fn feature_names_out(&self) -> &[String] {
        &self.feature_names_out
    }

    /// Encode the five categorical fields into one-hot indicators.
    pub fn encode(&self, fields: &CategoricalFields) -> Result<EncodedColumns> {
        let mut values = vec![0.0; self.feature_names_out.len()];
        let mut unknown = Vec::new();

        for (i, feature) in self.artifact.feature_names_in.iter().enumerate() {
            let value = fields.get(feature).ok_or_else(|| {
                VgSalesError::Validation(format!("missing categorical field: {}", feature))
            })?;

            match self.index[i].get(value) {
                Some(&pos) => values[self.offsets[i] + pos] = 1.0,
                None => match self.artifact.handle_unknown {
                    UnknownPolicy::Error => {
                        return Err(VgSalesError::Encoding {
                            feature: feature.clone(),
                            value: value.to_string(),
                        });
                    }
                    UnknownPolicy::Ignore => {
                        warn!(feature = %feature, value = %value, "Unknown category encoded as all zeros");
                        unknown.push(UnknownCategory {
                            feature: feature.clone(),
                            value: value.to_string(),
                        });
                    }
                },
            }
        }

        Ok(EncodedColumns { values, unknown })
    }

    /// Encode and pair each indicator with its column name.
    pub fn encode_named(&self, fields: &CategoricalFields) -> Result<Vec<(String, f64)>> {
        let encoded = self.encode(fields)?;
        Ok(self
            .feature_names_out
            .iter()
            .cloned()
            .zip(encoded.values)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(policy: UnknownPolicy) -> EncoderArtifact {
        EncoderArtifact {
            feature_names_in: CATEGORICAL_FEATURES.iter().map(|s| s.to_string()).collect(),
            categories: vec![
                vec!["PS4".into(), "Wii".into(), "X360".into()],
                vec!["Action".into(), "Sports".into()],
                vec!["E".into(), "M".into()],
                vec!["7ª Gen".into(), "8ª Gen".into()],
                vec!["Excellent".into(), "Good".into()],
            ],
            handle_unknown: policy,
        }
    }

    fn fields(platform: &str) -> CategoricalFields {
        CategoricalFields {
            platform: platform.into(),
            genre: "Action".into(),
            rating_esrb: "M".into(),
            gen_platform: "8ª Gen".into(),
            classification_user_score: "Good".into(),
        }
    }

    #[test]
    fn test_feature_names_out() {
        let encoder = OneHotEncoder::from_artifact(artifact(UnknownPolicy::Ignore)).unwrap();
        let names = encoder.feature_names_out();
        assert_eq!(names.len(), 11);
        assert_eq!(names[0], "platform_PS4");
        assert_eq!(names[3], "genre_Action");
        assert_eq!(names[10], "classification_user_score_Good");
    }

    #[test]
    fn test_encode_sets_one_indicator_per_feature() {
        let encoder = OneHotEncoder::from_artifact(artifact(UnknownPolicy::Ignore)).unwrap();
        let encoded = encoder.encode(&fields("Wii")).unwrap();
        assert_eq!(encoded.values, vec![0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        assert!(encoded.unknown.is_empty());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let encoder = OneHotEncoder::from_artifact(artifact(UnknownPolicy::Ignore)).unwrap();
        let first = encoder.encode_named(&fields("X360")).unwrap();
        for _ in 0..10 {
            assert_eq!(encoder.encode_named(&fields("X360")).unwrap(), first);
        }
    }

    #[test]
    fn test_unknown_ignored_as_zero_block() {
        let encoder = OneHotEncoder::from_artifact(artifact(UnknownPolicy::Ignore)).unwrap();
        let encoded = encoder.encode(&fields("Dreamcast")).unwrap();
        assert_eq!(&encoded.values[0..3], &[0.0, 0.0, 0.0]);
        assert_eq!(encoded.values.iter().sum::<f64>(), 4.0);
        assert_eq!(
            encoded.unknown,
            vec![UnknownCategory {
                feature: "platform".into(),
                value: "Dreamcast".into()
            }]
        );
    }

    #[test]
    fn test_unknown_rejected_under_error_policy() {
        let encoder = OneHotEncoder::from_artifact(artifact(UnknownPolicy::Error)).unwrap();
        let err = encoder.encode(&fields("Dreamcast")).unwrap_err();
        assert!(matches!(err, VgSalesError::Encoding { ref feature, .. } if feature == "platform"));
    }

    #[test]
    fn test_wrong_feature_order_rejected() {
        let mut bad = artifact(UnknownPolicy::Ignore);
        bad.feature_names_in.swap(0, 1);
        assert!(OneHotEncoder::from_artifact(bad).is_err());
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let mut bad = artifact(UnknownPolicy::Ignore);
        bad.categories[1].push("Action".into());
        assert!(OneHotEncoder::from_artifact(bad).is_err());
    }

    #[test]
    fn test_policy_defaults_to_ignore() {
        let json = r#"{"feature_names_in": ["platform","genre","rating_esrb","gen_platform","classification_user_score"],
                       "categories": [["PC"],["Action"],["E"],["PC"],["Good"]]}"#;
        let artifact: EncoderArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.handle_unknown, UnknownPolicy::Ignore);
    }
}
