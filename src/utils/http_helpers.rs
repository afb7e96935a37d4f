use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// A general purpose HTTP error type that can be converted into an `IntoResponse`.
#[derive(Debug)]
pub struct HTTPError {
    status: StatusCode,
    message: String,
}

impl HTTPError {
    /// Creates a new HTTP error with the given status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HTTPError {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Renders as `{"error": "<message>"}`.
impl IntoResponse for HTTPError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Failures surfaced by the transaction endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The body is not a well-formed transaction request.
    #[error("invalid request body: {0}")]
    Validation(String),
    /// The body parsed but the value is not strictly positive.
    #[error("transaction value must be positive")]
    Value,
    #[error("transaction not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Value => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApiError> for HTTPError {
    fn from(err: ApiError) -> Self {
        let message = match &err {
            ApiError::Validation(_) => "Invalid request body".to_string(),
            ApiError::Store(e) => {
                // Details stay in the log, the caller gets a generic message.
                error!(error = %e, "Store error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HTTPError::new(err.status(), message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        HTTPError::from(self).into_response()
    }
}
