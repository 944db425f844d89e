use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use placesh_core::{ColorError, WindowError};

use crate::canvas::CanvasClosed;
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid color: {0}")]
    InvalidColor(#[from] ColorError),

    #[error("Invalid window: {0}")]
    InvalidWindow(#[from] WindowError),

    #[error("Rate limited: retry in {}ms", .remaining.as_millis())]
    RateLimited { remaining: Duration },

    #[error("Unavailable: {0}")]
    Closed(#[from] CanvasClosed),
}

impl AppError {
    /// JSON body describing this error, shared by HTTP and WebSocket replies
    pub fn body(&self) -> serde_json::Value {
        match self {
            AppError::RateLimited { remaining } => json!({
                "error": "Rate limited",
                "retry_after_ms": remaining.as_millis() as u64,
            }),
            other => json!({ "error": other.to_string() }),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidColor(_) | AppError::InvalidWindow(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Closed(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::RateLimited { remaining } = &self {
            tracing::debug!(?remaining, "Request rate limited");
        }
        (self.status(), Json(self.body())).into_response()
    }
}
