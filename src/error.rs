//! Error types for the relay

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

/// Errors surfaced by the relay
///
/// Only startup failures and the optional webhook token check produce
/// errors. Delivery problems are logged and never propagated.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("Missing or invalid webhook token")]
    Unauthorized,

    #[error("Origin not allowed: {0}")]
    OriginRejected(String),
}

impl RelayError {
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        RelayError::Config {
            key: key.to_string(),
            message: message.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::OriginRejected(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            RelayError::Unauthorized => "unauthorized",
            RelayError::OriginRejected(_) => "origin_not_allowed",
            _ => "internal_error",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
