//! API error and response structures
//!
//! Handlers return [`ApiResult`]; any [`AppError`] bubbling out of the core
//! converts into an HTTP response with the unified JSON body:
//!
//! ```json
//! {
//!   "code": 4001,
//!   "error": "INVALID_TOKEN",
//!   "message": "No matching pickup credential"
//! }
//! ```

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shared::error::AppError;

/// Unified API response envelope
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// Numeric error code (0 = success)
    pub code: u16,
    /// Stable error identifier, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> AppResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            error: None,
            message: "success".to_string(),
            data: Some(data),
        }
    }
}

impl AppResponse<()> {
    pub fn failure(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            error: Some(err.code.name()),
            message: err.message.clone(),
            data: None,
        }
    }
}

/// Newtype carrying [`AppError`] through axum's response machinery
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.http_status();
        if status.is_server_error() {
            tracing::error!(code = %self.0.code, message = %self.0.message, "Request failed");
        }
        (status, Json(AppResponse::failure(&self.0))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
