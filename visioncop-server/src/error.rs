//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use visioncop_core::VisionError;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Engine error from visioncop-core
    #[error("Engine error: {0}")]
    Vision(#[from] VisionError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Vision(e) => match e {
                // The upload was received but is not a usable image
                VisionError::Decode { .. }
                | VisionError::Embedding(_)
                | VisionError::Metadata(_) => StatusCode::UNPROCESSABLE_ENTITY,

                VisionError::InvalidInput(_) => StatusCode::BAD_REQUEST,

                VisionError::Io { .. } | VisionError::Store(_) | VisionError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Vision(e) => match e {
                VisionError::Decode { .. } => "UNDECODABLE_IMAGE",
                VisionError::Embedding(_) => "EMBEDDING_FAILED",
                VisionError::Metadata(_) => "METADATA_ERROR",
                VisionError::InvalidInput(_) => "INVALID_INPUT",
                VisionError::Io { .. } => "IO_ERROR",
                VisionError::Store(_) => "INDEX_ERROR",
                VisionError::Serialization(_) => "SERIALIZATION_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // Server-side paths and store internals stay in the logs
            Self::Vision(e) => match e {
                VisionError::Decode { name, .. } => format!("Could not decode image '{}'", name),
                VisionError::Embedding(_) => "No embedding could be extracted from the image".to_string(),
                VisionError::Metadata(reason) => format!("Unreadable image metadata: {}", reason),
                VisionError::InvalidInput(reason) => format!("Invalid input: {}", reason),
                VisionError::Io { .. } => "Storage I/O failure".to_string(),
                VisionError::Store(_) => "Vector index failure".to_string(),
                VisionError::Serialization(_) => "Vector index serialization failure".to_string(),
            },
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
            Self::Vision(_) => "engine",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
