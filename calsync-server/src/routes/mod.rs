pub mod interactions;
pub mod meetings;
pub mod records;
pub mod status;
pub mod sync;
pub mod tasks;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use calsync_core::CalSyncError;
use serde::Serialize;
use tracing::error;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Vendor error body, when it was JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Convert anyhow errors to HTTP responses
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<CalSyncError>() {
            Some(CalSyncError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        self.0
            .downcast_ref::<CalSyncError>()
            .and_then(CalSyncError::upstream_body)
            .and_then(|body| serde_json::from_str(body).ok())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = status.as_u16(), error = %self.0, "Request failed");

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
            details: self.details(),
        });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
