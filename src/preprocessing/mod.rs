//! Request preprocessing
//!
//! Turns the raw fields of a prediction request into the feature vector the
//! regressor was trained on:
//! - One-hot encoding of the categorical fields with a fitted vocabulary
//! - Concatenation with the numeric fields in schema order

mod assembler;
mod encoder;
mod schema;

pub use assembler::{EncodedFeatureVector, FeatureAssembler};
pub use encoder::{EncodedColumns, EncoderArtifact, OneHotEncoder, UnknownCategory, UnknownPolicy};
pub use schema::{
    normalize_feature_name, CategoricalFields, FeatureSchema, NumericFields, CATEGORICAL_FEATURES,
    NUMERIC_FEATURES,
};
