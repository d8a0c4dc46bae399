//! Sales prediction
//!
//! Provides the prediction pipeline behind `POST /api/predict`:
//! - Request validation
//! - One-hot encoding and feature assembly
//! - Scoring with the fitted regressor, rounded for display

mod engine;
mod model;

pub use engine::{round_to, Predictor};
pub use model::{
    GbdtModel, LeafNode, LinearModel, MissingType, RegressionModel, SplitNode, TreeInfo, TreeNode,
};

use crate::error::{Result, VgSalesError};
use crate::preprocessing::{CategoricalFields, NumericFields, UnknownCategory};
use serde::{Deserialize, Serialize};

/// Eight feature values of a game to score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub platform: String,
    pub genre: String,
    pub rating_esrb: String,
    pub gen_platform: String,
    pub classification_user_score: String,
    pub year_of_release: i32,
    pub user_score: f64,
    pub critic_score: f64,
}

impl PredictionRequest {
    /// Reject blank categories and out-of-range scores.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.categorical().pairs() {
            if value.trim().is_empty() {
                return Err(VgSalesError::Validation(format!("{} must not be empty", name)));
            }
        }
        if !self.user_score.is_finite() || !(0.0..=10.0).contains(&self.user_score) {
            return Err(VgSalesError::Validation(format!(
                "user_score must be between 0 and 10, got {}",
                self.user_score
            )));
        }
        if !self.critic_score.is_finite() || !(0.0..=100.0).contains(&self.critic_score) {
            return Err(VgSalesError::Validation(format!(
                "critic_score must be between 0 and 100, got {}",
                self.critic_score
            )));
        }
        Ok(())
    }

    pub fn numeric(&self) -> NumericFields {
        NumericFields {
            year_of_release: self.year_of_release,
            user_score: self.user_score,
            critic_score: self.critic_score,
        }
    }

    pub fn categorical(&self) -> CategoricalFields {
        CategoricalFields {
            platform: self.platform.clone(),
            genre: self.genre.clone(),
            rating_esrb: self.rating_esrb.clone(),
            gen_platform: self.gen_platform.clone(),
            classification_user_score: self.classification_user_score.clone(),
        }
    }
}

/// Predicted global sales in millions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionOutcome {
    pub prediction: f64,
    /// Inputs encoded as all zeros because the encoder never saw them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_categories: Vec<UnknownCategory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PredictionRequest {
        PredictionRequest {
            platform: "PS4".into(),
            genre: "Action".into(),
            rating_esrb: "M".into(),
            gen_platform: "8ª Gen".into(),
            classification_user_score: "Good".into(),
            year_of_release: 2016,
            user_score: 8.1,
            critic_score: 86.0,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_blank_category_rejected() {
        let mut req = request();
        req.genre = "  ".into();
        assert!(matches!(req.validate(), Err(VgSalesError::Validation(ref m)) if m.contains("genre")));
    }

    #[test]
    fn test_score_ranges() {
        let mut req = request();
        req.user_score = 10.5;
        assert!(req.validate().is_err());

        let mut req = request();
        req.critic_score = f64::NAN;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_missing_field_fails_to_deserialize() {
        let json = r#"{"platform":"PS4","genre":"Action","rating_esrb":"M","gen_platform":"8ª Gen",
                       "classification_user_score":"Good","year_of_release":2016,"user_score":8.1}"#;
        let err = serde_json::from_str::<PredictionRequest>(json).unwrap_err();
        assert!(err.to_string().contains("critic_score"));
    }

    #[test]
    fn test_outcome_hides_empty_unknowns() {
        let outcome = PredictionOutcome {
            prediction: 1.25,
            unknown_categories: Vec::new(),
        };
        assert_eq!(serde_json::to_string(&outcome).unwrap(), r#"{"prediction":1.25}"#);
    }
}
