//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the unified error type for all API endpoints. It implements
//! `axum::response::IntoResponse` to produce structured JSON error responses
//! with appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use rmirec_codegen::CodegenError;
use rmirec_storage::StorageError;

/// Structured error detail in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API errors with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Session or artifact not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Posted bytes are not a valid call record (400).
    #[error("invalid call record: {message}")]
    InvalidRecord {
        message: String,
        /// "framing" or "corruption".
        kind: &'static str,
    },

    /// Internal server error (500).
    #[error("internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ApiErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: msg.clone(),
                    details: None,
                },
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorDetail {
                    code: "BAD_REQUEST".to_string(),
                    message: msg.clone(),
                    details: None,
                },
            ),
            ApiError::InvalidRecord { message, kind } => (
                StatusCode::BAD_REQUEST,
                ApiErrorDetail {
                    code: "INVALID_RECORD".to_string(),
                    message: message.clone(),
                    details: Some(serde_json::json!({ "kind": kind })),
                },
            ),
            ApiError::InternalError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    details: None,
                },
            ),
        };

        let body = serde_json::json!({
            "success": false,
            "error": detail,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if err.is_framing() {
            return ApiError::InvalidRecord {
                message: err.to_string(),
                kind: "framing",
            };
        }
        if err.is_corruption() {
            return ApiError::InvalidRecord {
                message: err.to_string(),
                kind: "corruption",
            };
        }
        match &err {
            StorageError::ArtifactNotFound(_) => ApiError::NotFound(err.to_string()),
            StorageError::State(_) | StorageError::AlreadyCompleted { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            _ => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<CodegenError> for ApiError {
    fn from(err: CodegenError) -> Self {
        match err {
            CodegenError::Storage(e) => ApiError::from(e),
            // A dangling reference inside a posted value graph is client data.
            CodegenError::Graph(e) => ApiError::BadRequest(e.to_string()),
            err @ CodegenError::NestingTooDeep { .. } => ApiError::BadRequest(err.to_string()),
        }
    }
}
