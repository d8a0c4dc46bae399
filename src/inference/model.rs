//! Fitted regression models
//!
//! Two artifact shapes are accepted:
//! - a gradient-boosted tree ensemble as written by LightGBM `dump_model()`
//! - a linear model with one coefficient per feature

use crate::error::{Result, VgSalesError};
use crate::preprocessing::EncodedFeatureVector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// |x| below this counts as zero for `missing_type = "Zero"` splits
const ZERO_THRESHOLD: f64 = 1e-35;

/// How a split routes missing values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingType {
    /// NaN is treated as 0.0 and compared normally
    #[default]
    None,
    /// Zero (and NaN) follow the default direction
    Zero,
    /// NaN follows the default direction
    NaN,
}

fn default_decision_type() -> String {
    "<=".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitNode {
    pub split_feature: usize,
    pub threshold: f64,
    #[serde(default = "default_decision_type")]
    pub decision_type: String,
    #[serde(default)]
    pub default_left: bool,
    #[serde(default)]
    pub missing_type: MissingType,
    pub left_child: Box<TreeNode>,
    pub right_child: Box<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafNode {
    pub leaf_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split(SplitNode),
    Leaf(LeafNode),
}

impl TreeNode {
    fn validate(&self, n_features: usize) -> Result<()> {
        match self {
            TreeNode::Leaf(leaf) if !leaf.leaf_value.is_finite() => Err(
                VgSalesError::DataUnavailable("tree leaf value is not finite".to_string()),
            ),
            TreeNode::Leaf(_) => Ok(()),
            TreeNode::Split(split) => {
                if split.decision_type != "<=" {
                    return Err(VgSalesError::DataUnavailable(format!(
                        "unsupported split decision type {:?}",
                        split.decision_type
                    )));
                }
                if split.split_feature >= n_features {
                    return Err(VgSalesError::DataUnavailable(format!(
                        "split on feature {} but model has {} features",
                        split.split_feature, n_features
                    )));
                }
                split.left_child.validate(n_features)?;
                split.right_child.validate(n_features)
            }
        }
    }

    fn leaf_for(&self, row: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return leaf.leaf_value,
                TreeNode::Split(split) => {
                    node = if split.goes_left(row[split.split_feature]) {
                        &*split.left_child
                    } else {
                        &*split.right_child
                    };
                }
            }
        }
    }
}

impl SplitNode {
    fn goes_left(&self, value: f64) -> bool {
        let value = if self.missing_type != MissingType::NaN && value.is_nan() {
            0.0
        } else {
            value
        };
        let missing = match self.missing_type {
            MissingType::None => false,
            MissingType::Zero => value.abs() <= ZERO_THRESHOLD,
            MissingType::NaN => value.is_nan(),
        };
        if missing {
            self.default_left
        } else {
            value <= self.threshold
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeInfo {
    #[serde(default)]
    pub tree_index: usize,
    pub tree_structure: TreeNode,
}

fn default_num_class() -> usize {
    1
}

/// Tree ensemble in LightGBM dump format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtModel {
    #[serde(default)]
    pub objective: String,
    #[serde(default = "default_num_class")]
    pub num_class: usize,
    pub feature_names: Vec<String>,
    pub tree_info: Vec<TreeInfo>,
}

impl GbdtModel {
    fn validate(&self) -> Result<()> {
        if self.num_class != 1 {
            return Err(VgSalesError::DataUnavailable(format!(
                "expected a single-output regressor, model has {} classes",
                self.num_class
            )));
        }
        if self.tree_info.is_empty() {
            return Err(VgSalesError::DataUnavailable("model has no trees".to_string()));
        }
        for tree in &self.tree_info {
            tree.tree_structure.validate(self.feature_names.len())?;
        }
        Ok(())
    }

    /// Objectives fitted on a log link
    fn uses_log_link(&self) -> bool {
        ["poisson", "gamma", "tweedie"]
            .iter()
            .any(|o| self.objective.starts_with(o))
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let raw: f64 = self
            .tree_info
            .iter()
            .map(|t| t.tree_structure.leaf_for(row))
            .sum();
        if self.uses_log_link() {
            raw.exp()
        } else {
            raw
        }
    }
}

/// Ordinary linear model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    fn validate(&self) -> Result<()> {
        if self.coefficients.len() != self.feature_names.len() {
            return Err(VgSalesError::DataUnavailable(format!(
                "linear model has {} coefficients for {} features",
                self.coefficients.len(),
                self.feature_names.len()
            )));
        }
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

/// A fitted regressor loaded once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegressionModel {
    Gbdt(GbdtModel),
    Linear(LinearModel),
}

impl RegressionModel {
    /// Load and validate a JSON model artifact.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|e| VgSalesError::unavailable(&shown, e))?;
        let model: Self =
            serde_json::from_str(&json).map_err(|e| VgSalesError::unavailable(&shown, e))?;
        model.validate().map_err(|e| VgSalesError::unavailable(&shown, e))?;

        info!(
            path = %shown,
            kind = model.kind(),
            features = model.feature_names().len(),
            "Loaded regression model"
        );
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            RegressionModel::Gbdt(m) => m.validate(),
            RegressionModel::Linear(m) => m.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RegressionModel::Gbdt(_) => "gbdt",
            RegressionModel::Linear(_) => "linear",
        }
    }

    pub fn feature_names(&self) -> &[String] {
        match self {
            RegressionModel::Gbdt(m) => &m.feature_names,
            RegressionModel::Linear(m) => &m.feature_names,
        }
    }

    /// Score one feature vector.
    pub fn predict(&self, features: &EncodedFeatureVector) -> Result<f64> {
        let expected = self.feature_names().len();
        if features.len() != expected {
            return Err(VgSalesError::Shape {
                expected,
                actual: features.len(),
            });
        }
        let row = features.as_slice();
        let value = match self {
            RegressionModel::Gbdt(m) => m.predict_row(row),
            RegressionModel::Linear(m) => m.predict_row(row),
        };
        if !value.is_finite() {
            return Err(VgSalesError::Prediction(format!(
                "model returned a non-finite value: {}",
                value
            )));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump_json() -> &'static str {
        r#"{
            "name": "tree",
            "version": "v4",
            "num_class": 1,
            "objective": "regression",
            "feature_names": ["year_of_release", "user_score"],
            "tree_info": [
                {
                    "tree_index": 0,
                    "num_leaves": 2,
                    "shrinkage": 1,
                    "tree_structure": {
                        "split_index": 0,
                        "split_feature": 0,
                        "split_gain": 10.5,
                        "threshold": 2005.5,
                        "decision_type": "<=",
                        "default_left": true,
                        "missing_type": "None",
                        "internal_value": 0,
                        "left_child": {"leaf_index": 0, "leaf_value": 0.5},
                        "right_child": {
                            "split_feature": 1,
                            "threshold": 7.0,
                            "decision_type": "<=",
                            "default_left": false,
                            "missing_type": "NaN",
                            "left_child": {"leaf_value": 1.0},
                            "right_child": {"leaf_value": 2.0}
                        }
                    }
                },
                {"tree_index": 1, "tree_structure": {"leaf_value": 0.25}}
            ]
        }"#
    }

    fn vector(values: &[f64]) -> EncodedFeatureVector {
        EncodedFeatureVector::from_values(values.to_vec())
    }

    #[test]
    fn test_parse_lightgbm_dump() {
        let model: RegressionModel = serde_json::from_str(stump_json()).unwrap();
        assert_eq!(model.kind(), "gbdt");
        model.validate().unwrap();
    }

    #[test]
    fn test_gbdt_sums_leaves() {
        let model: RegressionModel = serde_json::from_str(stump_json()).unwrap();
        assert_eq!(model.predict(&vector(&[2000.0, 9.0])).unwrap(), 0.75);
        assert_eq!(model.predict(&vector(&[2010.0, 6.0])).unwrap(), 1.25);
        assert_eq!(model.predict(&vector(&[2010.0, 8.0])).unwrap(), 2.25);
    }

    #[test]
    fn test_nan_follows_default_direction() {
        let model: RegressionModel = serde_json::from_str(stump_json()).unwrap();
        assert_eq!(model.predict(&vector(&[2010.0, f64::NAN])).unwrap(), 2.25);
    }

    #[test]
    fn test_linear_model() {
        let json = r#"{"feature_names": ["a", "b"], "intercept": 0.5, "coefficients": [2.0, -1.0]}"#;
        let model: RegressionModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.kind(), "linear");
        assert_eq!(model.predict(&vector(&[3.0, 1.0])).unwrap(), 5.5);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let model: RegressionModel = serde_json::from_str(stump_json()).unwrap();
        assert!(matches!(
            model.predict(&vector(&[1.0])),
            Err(VgSalesError::Shape { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_categorical_split_rejected() {
        let json = stump_json().replacen("\"decision_type\": \"<=\"", "\"decision_type\": \"==\"", 1);
        let model: RegressionModel = serde_json::from_str(&json).unwrap();
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_split_feature_out_of_range_rejected() {
        let json = stump_json().replacen("\"split_feature\": 1", "\"split_feature\": 7", 1);
        let model: RegressionModel = serde_json::from_str(&json).unwrap();
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_poisson_objective_uses_exp() {
        let json = stump_json().replacen("\"regression\"", "\"poisson\"", 1);
        let model: RegressionModel = serde_json::from_str(&json).unwrap();
        let value = model.predict(&vector(&[2000.0, 9.0])).unwrap();
        assert!((value - 0.75f64.exp()).abs() < 1e-12);
    }
}
