//! API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gateway_core::ApodError;
use serde::Serialize;
use tracing::error;

/// JSON error body
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Short description
    pub error: String,
    /// Detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Stable error tag
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<&'static str>,
}

/// Error returned by handlers
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                message: None,
                error_type: None,
            },
        }
    }

    /// 400 with `{ "error": message }`
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 404 with `{ "error": message }`
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 429 with `{ "error": message }`
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    /// 500 with a generic error and `message` as detail
    pub fn internal(message: impl Into<String>) -> Self {
        let mut err = Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        err.body.message = Some(message.into());
        err
    }

    /// HTTP status
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response body
    #[must_use]
    pub fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl From<ApodError> for ApiError {
    fn from(err: ApodError) -> Self {
        if let ApodError::ConfigValidation { message, .. } = err {
            return Self::bad_request(message);
        }

        let status = StatusCode::from_u16(err.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        Self {
            status,
            body: ErrorBody {
                error: "Failed to fetch APOD data".to_string(),
                message: Some(err.to_string()),
                error_type: Some(err.error_type()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                status = self.status.as_u16(),
                error = %self.body.error,
                message = ?self.body.message,
                "Request failed"
            );
        }
        (self.status, Json(self.body)).into_response()
    }
}
