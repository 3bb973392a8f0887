//! Error-to-HTTP response conversion.
//!
//! Wraps [`vogel_core::Error`] so route handlers can return
//! `Result<T, AppError>` and still use `?` on core and store calls.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: vogel_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: vogel_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }
}

impl From<vogel_core::Error> for AppError {
    fn from(e: vogel_core::Error) -> Self {
        Self::new(e)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::new(vogel_core::Error::Internal(format!("Background task failed: {e}")))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let code = match &self.inner {
            vogel_core::Error::NotFound { .. } => "not_found",
            vogel_core::Error::Forbidden(_) => "forbidden",
            vogel_core::Error::Validation(_) => "validation_error",
            vogel_core::Error::Storage { .. } => "storage_error",
            vogel_core::Error::Io { .. } => "io_error",
            vogel_core::Error::Image(_) => "image_error",
            vogel_core::Error::Misconfigured(_) => "misconfigured",
            vogel_core::Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": self.inner.to_string(),
            "code": code,
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}
