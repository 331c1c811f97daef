//! Error handling for the irrigation advisory service
//!
//! Only validation failures surface to the caller of the pipeline; upstream
//! failures are absorbed by the stage that hit them and reported as
//! [`shared::ErrorKind`] codes on the result.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::PipelineStage;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    // External service errors
    #[error("Geocoding failed: {0}")]
    GeocodingFailure(String),

    #[error("Weather unavailable: {0}")]
    WeatherUnavailable(String),

    #[error("Advisory generation failed: {0}")]
    AdvisoryGenerationFailure(String),

    #[error("{service} error: {message}")]
    ExternalService {
        service: &'static str,
        /// HTTP status when the upstream answered at all
        status: Option<u16>,
        message: String,
    },

    /// The upstream answered but the body could not be decoded
    #[error("{service} returned an unreadable payload: {message}")]
    InvalidPayload {
        service: &'static str,
        message: String,
    },

    #[error("Stage {0} timed out")]
    StageTimeout(PipelineStage),

    #[error("Request cancelled")]
    Cancelled,

    // Storage errors
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Upstream error from a failed `reqwest` call
    pub fn from_request(service: &'static str, err: reqwest::Error) -> Self {
        AppError::ExternalService {
            service,
            status: err.status().map(|s| s.as_u16()),
            message: if err.is_timeout() {
                "request timed out".to_string()
            } else {
                err.to_string()
            },
        }
    }

    /// Whether one more attempt could reasonably succeed
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::ExternalService { status, .. } => match status {
                None => true,
                Some(code) => *code == 429 || *code >= 500,
            },
            AppError::StageTimeout(_) => true,
            _ => false,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation { .. })
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::GeocodingFailure(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "GEOCODING_FAILURE".to_string(),
                    message: format!("Geocoding failed: {}", msg),
                    field: None,
                },
            ),
            AppError::WeatherUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "WEATHER_UNAVAILABLE".to_string(),
                    message: "Weather service is temporarily unavailable".to_string(),
                    field: None,
                },
            ),
            AppError::AdvisoryGenerationFailure(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "ADVISORY_GENERATION_FAILURE".to_string(),
                    message: format!("Advisory generation failed: {}", msg),
                    field: None,
                },
            ),
            AppError::ExternalService { service, message, .. } => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_SERVICE_ERROR".to_string(),
                    message: format!("{} error: {}", service, message),
                    field: None,
                },
            ),
            AppError::InvalidPayload { service, .. } => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_SERVICE_ERROR".to_string(),
                    message: format!("{} returned an unreadable response", service),
                    field: None,
                },
            ),
            AppError::StageTimeout(stage) => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorDetail {
                    code: "STAGE_TIMEOUT".to_string(),
                    message: format!("Stage {} timed out", stage),
                    field: None,
                },
            ),
            AppError::Cancelled => (
                StatusCode::REQUEST_TIMEOUT,
                ErrorDetail {
                    code: "CANCELLED".to_string(),
                    message: "The request was cancelled".to_string(),
                    field: None,
                },
            ),
            AppError::StorageError(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "STORAGE_ERROR".to_string(),
                    message: format!("Storage error: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message: format!("Configuration error: {}", msg),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
