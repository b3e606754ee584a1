use crate::error::{EvalError, Service};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub mod analysis;
pub mod evaluation;
pub mod handler;
pub mod hamsa;
pub mod middleware;
pub mod reports;
#[cfg(test)]
mod tests;
pub use handler::router;

/// JSON error body returned by every route: `{error, details?, responsePreview?}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
            response_preview: None,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.response_preview = Some(preview.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("Invalid request body").with_details(rejection.body_text())
    }
}

/// Completion-provider failures mirror the upstream status; anything the
/// provider could not have meant as an error status falls back to 500.
pub(crate) fn upstream_status(service: Service, status: u16) -> StatusCode {
    match service {
        Service::Completion => StatusCode::from_u16(status)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Service::VoiceProvider => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Generic mapping for routes that only pass provider errors through.
impl From<EvalError> for ApiError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::Validation(message) => ApiError::bad_request(message),
            EvalError::Upstream {
                service, status, ..
            } => ApiError::new(upstream_status(service, status), err.to_string()),
            other => ApiError::internal(other.to_string()),
        }
    }
}
