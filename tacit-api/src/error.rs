//! Error types for tacit-api
//!
//! Startup failures use [`tacit_common::Error`]; this module covers errors
//! raised while serving a request. Every variant renders as
//! `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::sampler::SampleError;

/// Message returned for malformed annotation payloads
pub const INVALID_DATA: &str = "Invalid data received.";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller sent missing or malformed input (400)
    #[error("{0}")]
    BadRequest(String),

    /// Sampler could not produce a row (500)
    #[error(transparent)]
    Sample(#[from] SampleError),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_data() -> Self {
        ApiError::BadRequest(INVALID_DATA.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Sample(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!("Request failed: {}", message);
        } else {
            warn!("Rejected request: {}", message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
