//! Error handling for the Wildfire Risk service
//!
//! Every external call site maps its own failure to a dedicated variant, so a
//! caller can always tell a transport failure from a validation problem.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    // External service errors
    #[error("Earth Engine error: {0}")]
    EarthEngine(String),

    #[error("Prediction service error: {0}")]
    PredictionService(String),

    #[error("Text generation error: {0}")]
    TextGeneration(String),

    #[error("Unusable provider data: {0}")]
    ProviderData(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Email delivery error: {0}")]
    Email(String),

    #[error("Google credentials error: {0}")]
    GoogleAuth(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Network, authentication or quota failure talking to an external service
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            AppError::EarthEngine(_)
                | AppError::PredictionService(_)
                | AppError::TextGeneration(_)
                | AppError::Storage(_)
                | AppError::Email(_)
                | AppError::GoogleAuth(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|f| f.to_string())
            .unwrap_or_default();
        AppError::Validation {
            field,
            message: errors.to_string(),
        }
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

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("TOKEN_EXPIRED", "Token has expired"),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_TOKEN", "Invalid token"),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg.clone()),
            ),
            AppError::EarthEngine(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new("EARTH_ENGINE_ERROR", format!("Earth Engine error: {}", msg)),
            ),
            AppError::PredictionService(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new(
                    "PREDICTION_SERVICE_ERROR",
                    format!("Prediction service error: {}", msg),
                ),
            ),
            AppError::TextGeneration(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new(
                    "TEXT_GENERATION_ERROR",
                    format!("Text generation error: {}", msg),
                ),
            ),
            AppError::ProviderData(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new("PROVIDER_DATA_ERROR", format!("Unusable provider data: {}", msg)),
            ),
            AppError::Storage(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new("STORAGE_ERROR", format!("Storage error: {}", msg)),
            ),
            AppError::Email(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new("EMAIL_ERROR", format!("Email delivery error: {}", msg)),
            ),
            AppError::GoogleAuth(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new(
                    "GOOGLE_AUTH_ERROR",
                    format!("Google credentials error: {}", msg),
                ),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("CONFIGURATION_ERROR", format!("Configuration error: {}", msg)),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
