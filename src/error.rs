//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::ml_service::MlError;
use crate::services::trading_assistant::AssistantError;

/// Error response body. The `detail` field carries the failure message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Application error type for HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or invalid bearer credentials
    #[error("{0}")]
    Unauthorized(String),
    /// Invalid request body (validation error)
    #[error("{0}")]
    Validation(String),
    /// Resource not found
    #[error("{0}")]
    NotFound(String),
    /// Downstream service failure, surfaced verbatim in `detail`
    #[error("{0}")]
    Service(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            detail: self.to_string(),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(detail = %body.detail, "request failed");
        }

        (status, Json(body)).into_response()
    }
}

impl From<MlError> for AppError {
    fn from(err: MlError) -> Self {
        AppError::Service(err.to_string())
    }
}

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        AppError::Service(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation error: {}", err))
    }
}
