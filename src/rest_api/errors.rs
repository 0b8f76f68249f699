//! # REST API Errors
//!
//! Error taxonomy for the Balade endpoints and its translation to HTTP
//! status codes. Every handler returns [`RestResult`], so each failure
//! leaves as a JSON body with a status code.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// REST API errors
#[derive(Debug, Clone, Error)]
pub enum RestError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Path identifier is not a well-formed record id
    #[error("Invalid ID: {0}")]
    InvalidIdentifier(String),

    /// Body content rejected by field checks
    #[error("{0}")]
    ValidationFailed(String),

    /// Body is not valid JSON
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// No record with a valid id
    #[error("Balade not found")]
    NotFound,

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Underlying store failure. The detail is logged, never sent.
    #[error("Internal error")]
    Internal(String),
}

impl RestError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            RestError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            RestError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RestError::NotFound => StatusCode::NOT_FOUND,
            RestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for RestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidIdentifier(id) => RestError::InvalidIdentifier(id),
            StoreError::InvalidDocument(_)
            | StoreError::InvalidPattern(_)
            | StoreError::MissingRequiredFields(_) => RestError::ValidationFailed(err.to_string()),
            StoreError::Io { .. } | StoreError::Serialization(_) | StoreError::Poisoned => {
                RestError::Internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for RestError {
    fn from(rejection: JsonRejection) -> Self {
        RestError::InvalidBody(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<RestError> for ErrorResponse {
    fn from(err: RestError) -> Self {
        Self {
            code: err.status_code().as_u16(),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let RestError::Internal(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}
