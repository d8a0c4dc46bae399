//! Error types for the vgsales service

use thiserror::Error;

/// Result type alias for vgsales operations
pub type Result<T> = std::result::Result<T, VgSalesError>;

/// Main error type for the analytics and prediction core
#[derive(Error, Debug)]
pub enum VgSalesError {
    /// Malformed or missing request fields, rejected before the pipeline runs
    #[error("Validation error: {0}")]
    Validation(String),

    /// A categorical value outside the encoder vocabulary under the `error` policy
    #[error("Encoding error: unknown category {value:?} for feature {feature}")]
    Encoding { feature: String, value: String },

    /// Any failure while assembling features or running the model
    #[error("Prediction error: {0}")]
    Prediction(String),

    /// Dataset or artifacts could not be loaded; fatal at startup
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// The dataset holds no rows
    #[error("No data: the dataset is empty")]
    NoData,

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: usize, actual: usize },
}

impl VgSalesError {
    /// Wrap any error raised while loading startup state as `DataUnavailable`.
    pub fn unavailable(context: &str, err: impl std::fmt::Display) -> Self {
        VgSalesError::DataUnavailable(format!("{}: {}", context, err))
    }
}

impl From<polars::error::PolarsError> for VgSalesError {
    fn from(err: polars::error::PolarsError) -> Self {
        VgSalesError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for VgSalesError {
    fn from(err: serde_json::Error) -> Self {
        VgSalesError::Serialization(err.to_string())
    }
}
