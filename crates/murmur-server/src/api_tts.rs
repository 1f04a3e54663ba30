//! Speech proxy endpoints.
//!
//! Both endpoints keep provider credentials on the server and hand the
//! synthesized audio back as base64 inside `{"message": ..}`.

use crate::api::ApiError;
use crate::AppState;
use axum::extract::{rejection::JsonRejection, Extension, Json};
use murmur_types::{SpeechRequest, SpeechResponse};
use std::sync::Arc;

fn parse_request(
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<SpeechRequest, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if request.message.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }
    Ok(request)
}

/// Handler for `POST /api/openaitts`.
///
/// `message` is plain text. A missing voice uses the configured default.
pub async fn openai_tts_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Json<SpeechResponse>, ApiError> {
    let request = parse_request(payload)?;
    tracing::debug!(
        chars = request.message.chars().count(),
        voice = request.voice.as_deref().unwrap_or("<default>"),
        "key-auth speech request"
    );

    let audio = state
        .providers
        .synthesize_text(&request.message, request.voice.as_deref())
        .await?;

    Ok(Json(SpeechResponse {
        message: audio.into_string(),
    }))
}

/// Handler for `POST /api/azuretts`.
///
/// `message` is a complete SSML document built by the client; the voice is
/// already inside it, so the `voice` field is ignored.
pub async fn azure_tts_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Json<SpeechResponse>, ApiError> {
    let request = parse_request(payload)?;
    tracing::debug!(bytes = request.message.len(), "token-auth speech request");

    let audio = state.providers.synthesize_markup(&request.message).await?;

    Ok(Json(SpeechResponse {
        message: audio.into_string(),
    }))
}
