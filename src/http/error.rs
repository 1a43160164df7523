//! API error taxonomy.
//!
//! # Design Decisions
//! - Storage and validation errors are rendered as structured JSON, never
//!   as raw internal failure text
//! - Verification failures are not errors at all; they are 200 responses
//!   with `verified: false`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors surfaced at the registry API boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Requested resource does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// Missing or malformed input (400).
    #[error("{0}")]
    Validation(String),

    /// Ledger I/O failure (500); propagated, never swallowed.
    #[error("storage failure")]
    Storage(#[from] LedgerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Storage(e) => {
                // Log the detail, return a generic message.
                tracing::error!(error = %e, "Ledger storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal storage error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
