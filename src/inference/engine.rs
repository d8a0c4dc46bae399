//! Prediction service
//!
//! Holds the fitted encoder, the feature assembler and the regressor. All three
//! are read-only after construction, so one `Predictor` is shared by every
//! request handler without locking.

use crate::error::{Result, VgSalesError};
use crate::preprocessing::{FeatureAssembler, FeatureSchema, OneHotEncoder};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::{PredictionOutcome, PredictionRequest, RegressionModel};

/// Decimal places of the returned prediction
const DISPLAY_DECIMALS: i32 = 2;

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[derive(Debug, Clone)]
pub struct Predictor {
    encoder: OneHotEncoder,
    assembler: FeatureAssembler,
    model: RegressionModel,
}

impl Predictor {
    /// Pair an encoder with a model, checking the model was fit on the
    /// columns this encoder produces, in the same order.
    pub fn new(encoder: OneHotEncoder, model: RegressionModel) -> Result<Self> {
        model.validate()?;
        let schema = FeatureSchema::from_encoder(&encoder);
        schema.check_model_features(model.feature_names())?;
        info!(
            features = schema.len(),
            onehot_columns = schema.onehot_len(),
            model = model.kind(),
            policy = ?encoder.policy(),
            "Prediction pipeline ready"
        );
        Ok(Self {
            encoder,
            assembler: FeatureAssembler::new(schema),
            model,
        })
    }

    /// Load both artifacts from disk.
    pub fn load(encoder_path: impl AsRef<Path>, model_path: impl AsRef<Path>) -> Result<Self> {
        let encoder = OneHotEncoder::load(encoder_path)?;
        let model = RegressionModel::load(model_path)?;
        Self::new(encoder, model)
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.assembler.schema()
    }

    /// Validate, encode, assemble and score one request.
    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionOutcome> {
        request.validate()?;
        let start = Instant::now();

        let encoded = self.encoder.encode(&request.categorical())?;
        let unknown_categories = encoded.unknown.clone();

        let raw = self
            .assembler
            .assemble(&request.numeric(), &encoded)
            .and_then(|features| self.model.predict(&features))
            .map_err(|e| match e {
                VgSalesError::Prediction(_) => e,
                other => VgSalesError::Prediction(other.to_string()),
            })?;

        let prediction = round_to(raw, DISPLAY_DECIMALS);
        debug!(
            raw,
            prediction,
            unknown = unknown_categories.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Prediction computed"
        );

        Ok(PredictionOutcome {
            prediction,
            unknown_categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::LinearModel;
    use crate::preprocessing::{EncoderArtifact, UnknownPolicy, CATEGORICAL_FEATURES};

    fn encoder(policy: UnknownPolicy) -> OneHotEncoder {
        OneHotEncoder::from_artifact(EncoderArtifact {
            feature_names_in: CATEGORICAL_FEATURES.iter().map(|s| s.to_string()).collect(),
            categories: vec![
                vec!["PS4".into(), "Wii".into()],
                vec!["Action".into()],
                vec!["M".into()],
                vec!["8ª Gen".into()],
                vec!["Good".into()],
            ],
            handle_unknown: policy,
        })
        .unwrap()
    }

    fn linear(encoder: &OneHotEncoder) -> RegressionModel {
        let schema = FeatureSchema::from_encoder(encoder);
        // 0.001 per year, 0.1 per user point, 0.01 per critic point, +1 for PS4
        let mut coefficients = vec![0.001, 0.1, 0.01];
        coefficients.extend([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        RegressionModel::Linear(LinearModel {
            feature_names: schema.names().to_vec(),
            intercept: -2.0,
            coefficients,
        })
    }

    fn request(platform: &str) -> PredictionRequest {
        PredictionRequest {
            platform: platform.into(),
            genre: "Action".into(),
            rating_esrb: "M".into(),
            gen_platform: "8ª Gen".into(),
            classification_user_score: "Good".into(),
            year_of_release: 2016,
            user_score: 8.0,
            critic_score: 80.0,
        }
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(2.675001, 2), 2.68);
        assert_eq!(round_to(-0.005001, 2), -0.01);
    }

    #[test]
    fn test_round_to_ties_even() {
        assert_eq!(round_to(2.125, 2), 2.12);
        assert_eq!(round_to(0.625, 2), 0.62);
        assert_eq!(round_to(0.375, 2), 0.38);
    }

    #[test]
    fn test_predict_rounds_to_two_decimals() {
        let enc = encoder(UnknownPolicy::Ignore);
        let model = linear(&enc);
        let predictor = Predictor::new(enc, model).unwrap();

        // -2 + 2.016 + 0.8 + 0.8 + 1
        let outcome = predictor.predict(&request("PS4")).unwrap();
        assert_eq!(outcome.prediction, 2.62);
        assert!(outcome.unknown_categories.is_empty());
    }

    #[test]
    fn test_predict_is_deterministic() {
        let enc = encoder(UnknownPolicy::Ignore);
        let model = linear(&enc);
        let predictor = Predictor::new(enc, model).unwrap();
        let first = predictor.predict(&request("Wii")).unwrap();
        for _ in 0..5 {
            assert_eq!(predictor.predict(&request("Wii")).unwrap(), first);
        }
    }

    #[test]
    fn test_unknown_platform_scored_with_zero_block() {
        let enc = encoder(UnknownPolicy::Ignore);
        let model = linear(&enc);
        let predictor = Predictor::new(enc, model).unwrap();

        let outcome = predictor.predict(&request("Dreamcast")).unwrap();
        assert_eq!(outcome.prediction, 1.62);
        assert_eq!(outcome.unknown_categories.len(), 1);
        assert_eq!(outcome.unknown_categories[0].value, "Dreamcast");
    }

    #[test]
    fn test_unknown_platform_rejected_under_error_policy() {
        let enc = encoder(UnknownPolicy::Error);
        let model = linear(&enc);
        let predictor = Predictor::new(enc, model).unwrap();
        assert!(matches!(
            predictor.predict(&request("Dreamcast")),
            Err(VgSalesError::Encoding { .. })
        ));
    }

    #[test]
    fn test_invalid_request_rejected_before_encoding() {
        let enc = encoder(UnknownPolicy::Error);
        let model = linear(&enc);
        let predictor = Predictor::new(enc, model).unwrap();
        let mut req = request("Dreamcast");
        req.critic_score = 120.0;
        assert!(matches!(predictor.predict(&req), Err(VgSalesError::Validation(_))));
    }

    #[test]
    fn test_model_column_order_mismatch_rejected() {
        let enc = encoder(UnknownPolicy::Ignore);
        let mut model = linear(&enc);
        if let RegressionModel::Linear(ref mut m) = model {
            m.feature_names.swap(0, 1);
        }
        assert!(matches!(
            Predictor::new(enc, model),
            Err(VgSalesError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_out_of_range_split_rejected() {
        use crate::inference::{GbdtModel, LeafNode, SplitNode, TreeInfo, TreeNode};

        let enc = encoder(UnknownPolicy::Ignore);
        let names = FeatureSchema::from_encoder(&enc).names().to_vec();
        let leaf = |v| Box::new(TreeNode::Leaf(LeafNode { leaf_value: v }));
        let model = RegressionModel::Gbdt(GbdtModel {
            objective: "regression".into(),
            num_class: 1,
            feature_names: names,
            tree_info: vec![TreeInfo {
                tree_index: 0,
                tree_structure: TreeNode::Split(SplitNode {
                    split_feature: 99,
                    threshold: 0.5,
                    decision_type: "<=".into(),
                    default_left: true,
                    missing_type: Default::default(),
                    left_child: leaf(0.0),
                    right_child: leaf(1.0),
                }),
            }],
        });
        assert!(matches!(
            Predictor::new(enc, model),
            Err(VgSalesError::DataUnavailable(ref m)) if m.contains("99")
        ));
    }

    #[test]
    fn test_lightgbm_style_names_accepted() {
        let enc = encoder(UnknownPolicy::Ignore);
        let mut model = linear(&enc);
        if let RegressionModel::Linear(ref mut m) = model {
            for name in m.feature_names.iter_mut() {
                *name = name.replace(' ', "_");
            }
        }
        assert!(Predictor::new(enc, model).is_ok());
    }
}
