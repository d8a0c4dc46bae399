//! vgsales - Video game sales analytics and prediction
//!
//! This crate provides:
//! - Loading of the cleaned sales dataset and its derived features
//! - One-hot encoding and feature assembly for the fitted sales regressor
//! - Dashboard aggregates (KPIs, top platforms, regional split, yearly sales)
//! - An HTTP API and a terminal client
//!
//! # Modules
//!
//! - [`dataset`] - Typed game records, CSV/Parquet loading, feature derivation
//! - [`preprocessing`] - Encoder adapter and feature assembler
//! - [`inference`] - Regression models and the prediction service
//! - [`analytics`] - Aggregation engine and filter catalog
//! - [`server`] - REST API over axum
//! - [`cli`] - Command-line interface

pub mod error;

pub mod dataset;
pub mod preprocessing;
pub mod inference;
pub mod analytics;

pub mod server;
pub mod cli;

pub use error::{Result, VgSalesError};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analytics::{aggregate, filter_options, AggregateReport, FilterOptions, FilterQuery};
    pub use crate::dataset::{Dataset, GameRecord, Region, RegionalSales};
    pub use crate::error::{Result, VgSalesError};
    pub use crate::inference::{PredictionOutcome, PredictionRequest, Predictor, RegressionModel};
    pub use crate::preprocessing::{FeatureAssembler, FeatureSchema, OneHotEncoder, UnknownPolicy};
    pub use crate::server::{AppState, ServerConfig};
}
