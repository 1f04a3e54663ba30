//! Error envelope shared by every handler.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use murmur_tts::TtsError;
use murmur_types::ErrorEnvelope;
use thiserror::Error;

/// Code carried by access-code rejections.
pub const ACCESS_CODE_ERROR: &str = "Access Code Error";

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("access code missing or wrong")]
    AccessDenied,
    #[error(transparent)]
    Tts(#[from] TtsError),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {
    /// HTTP status and envelope code for this error.
    ///
    /// Upstream rejections are forwarded with their own status and the status
    /// number as the code. Failures that never reached a provider status map
    /// onto gateway codes.
    fn status_and_code(&self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "400".to_string()),
            ApiError::AccessDenied => (StatusCode::UNAUTHORIZED, ACCESS_CODE_ERROR.to_string()),
            ApiError::Tts(TtsError::Provider { status, .. }) => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                status.to_string(),
            ),
            ApiError::Tts(TtsError::Auth { .. }) | ApiError::Tts(TtsError::Network(_)) => {
                (StatusCode::BAD_GATEWAY, "502".to_string())
            }
            ApiError::Tts(TtsError::NotConfigured(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "503".to_string())
            }
            ApiError::Tts(TtsError::Decode(_)) | ApiError::InternalServerError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "500".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        }
        let body = Json(ErrorEnvelope::new(code, self.to_string()));
        (status, body).into_response()
    }
}
