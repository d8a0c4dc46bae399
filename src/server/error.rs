//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::VgSalesError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Core(#[from] VgSalesError),

    /// Body or query string that could not be parsed
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Core(VgSalesError::Validation(_) | VgSalesError::Encoding { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServerError::Core(VgSalesError::NoData | VgSalesError::DataUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ServerError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServerError::Core(VgSalesError::Prediction(_)) => {
                tracing::error!(detail = %self, "Prediction failed");
                self.to_string()
            }
            ServerError::Core(VgSalesError::Io(e)) => {
                tracing::error!(detail = %e, "IO error");
                "A file system error occurred".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
