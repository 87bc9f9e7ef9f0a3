//! Unified relay error type.
//!
//! Every handler returns `Result<T, RelayError>`, which implements
//! [`axum::response::IntoResponse`] so errors are converted to a JSON
//! body carrying a short tag and a human-readable message. Upstream
//! provider failures replay the provider's status and body verbatim.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// All errors that can terminate a relay request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The request body is missing one or more required fields.
    #[error("missing required field(s): {0}")]
    MissingFields(String),

    /// A required secret is absent from the environment.
    #[error("missing required credential(s): {0}")]
    MissingCredentials(String),

    /// The inference provider answered with a non-success status.
    #[error("upstream error ({status})")]
    Upstream { status: StatusCode, body: String },

    /// An unclassified internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::MissingFields(fields) => error_body(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                &format!("missing required field(s): {fields}"),
            ),
            RelayError::MissingCredentials(vars) => {
                error!(missing = %vars, "required credentials absent");
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    &format!("server is missing required credential(s): {vars}"),
                )
            }
            // Status and body pass through untouched.
            RelayError::Upstream { status, body } => (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            RelayError::Internal(message) => {
                error!(message = %message, "internal relay error");
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error",
                )
            }
        }
    }
}

fn error_body(status: StatusCode, tag: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "type": tag, "message": message } })),
    )
        .into_response()
}

impl From<anyhow::Error> for RelayError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = ?e, "converting anyhow error to RelayError::Internal");
        RelayError::Internal(e.to_string())
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        error!(error = %e, "upstream request transport failure");
        RelayError::Internal(e.to_string())
    }
}
