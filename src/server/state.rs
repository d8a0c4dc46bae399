//! Application state management

use std::sync::Arc;
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::inference::Predictor;

use super::ServerConfig;

/// Read-only state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    pub dataset: Arc<Dataset>,
    pub predictor: Arc<Predictor>,
}

impl AppState {
    pub fn new(config: ServerConfig, dataset: Dataset, predictor: Predictor) -> Self {
        Self {
            config,
            dataset: Arc::new(dataset),
            predictor: Arc::new(predictor),
        }
    }

    /// Load the dataset and both artifacts. Any failure aborts startup.
    pub fn load(config: &ServerConfig) -> Result<Self> {
        let dataset = Dataset::load(&config.data_path)?;
        if dataset.is_empty() {
            warn!(path = %config.data_path.display(), "Dataset is empty, analytics endpoints will return 503");
        }
        let predictor = Predictor::load(&config.encoder_path, &config.model_path)?;

        info!(
            records = dataset.len(),
            features = predictor.schema().len(),
            "Application state loaded"
        );
        Ok(Self::new(config.clone(), dataset, predictor))
    }
}
