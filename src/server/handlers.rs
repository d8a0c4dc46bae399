//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analytics::{self, AggregateReport, FilterOptions, FilterQuery};
use crate::error::VgSalesError;
use crate::inference::{PredictionOutcome, PredictionRequest};

use super::error::{Result, ServerError};
use super::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub records: usize,
    pub features: usize,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        records: state.dataset.len(),
        features: state.predictor.schema().len(),
    })
}

// ============================================================================
// Prediction
// ============================================================================

pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionOutcome>> {
    let Json(request) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let outcome = state.predictor.predict(&request).map_err(|e| {
        warn!(error = %e, platform = %request.platform, genre = %request.genre, "Prediction rejected");
        ServerError::from(e)
    })?;

    info!(
        prediction = outcome.prediction,
        unknown = outcome.unknown_categories.len(),
        "Prediction served"
    );
    Ok(Json(outcome))
}

// ============================================================================
// Analytics
// ============================================================================

pub async fn filter_options(State(state): State<Arc<AppState>>) -> Result<Json<FilterOptions>> {
    Ok(Json(analytics::filter_options(&state.dataset)?))
}

fn parse_year(key: &str, value: &str) -> std::result::Result<i32, VgSalesError> {
    value
        .trim()
        .parse()
        .map_err(|_| VgSalesError::Validation(format!("{} must be an integer year, got {:?}", key, value)))
}

/// Build a [`FilterQuery`] from raw query pairs. `genres` may repeat.
pub fn filter_from_pairs(pairs: &[(String, String)]) -> std::result::Result<FilterQuery, VgSalesError> {
    let mut query = FilterQuery::default();
    for (key, value) in pairs {
        match key.as_str() {
            "genres" => query.genres.push(value.clone()),
            "start" => query.start = parse_year(key, value)?,
            "end" => query.end = parse_year(key, value)?,
            _ => {}
        }
    }
    query.validate()?;
    Ok(query)
}

pub async fn aggregate(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<AggregateReport>> {
    let Query(pairs) = params.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let query = filter_from_pairs(&pairs)?;

    if state.dataset.is_empty() {
        return Err(VgSalesError::NoData.into());
    }

    Ok(Json(analytics::aggregate(&state.dataset, &query)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_filter_defaults() {
        let query = filter_from_pairs(&[]).unwrap();
        assert_eq!(query, FilterQuery::default());
    }

    #[test]
    fn test_repeated_genres() {
        let query = filter_from_pairs(&pairs(&[
            ("genres", "Action"),
            ("start", "2000"),
            ("genres", "Sports"),
            ("end", "2010"),
        ]))
        .unwrap();
        assert_eq!(query.genres, vec!["Action", "Sports"]);
        assert_eq!((query.start, query.end), (2000, 2010));
    }

    #[test]
    fn test_bad_year_rejected() {
        let err = filter_from_pairs(&pairs(&[("start", "nineteen")])).unwrap_err();
        assert!(matches!(err, VgSalesError::Validation(ref m) if m.contains("start")));
        assert!(filter_from_pairs(&pairs(&[("start", "2010"), ("end", "2000")])).is_err());
    }
}
