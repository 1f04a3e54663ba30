//! Client for the speech proxy endpoints served by `murmur-server`.
//!
//! This is what the browser does: pick the endpoint from the provider brand,
//! build the SSML document locally for the token-authenticated provider, and
//! read the base64 audio out of the JSON response.

use crate::error::TtsError;
use crate::markup::build_markup;
use crate::provider::{SynthesisResult, Synthesizer};
use crate::transcode::EncodedAudio;
use async_trait::async_trait;
use murmur_types::{ErrorEnvelope, ProviderKind, SpeechRequest, SpeechResponse, SynthesisRequest};
use tracing::warn;

/// Path of the key-authenticated proxy endpoint.
pub const KEY_AUTH_PATH: &str = "/api/openaitts";
/// Path of the token-authenticated proxy endpoint.
pub const TOKEN_AUTH_PATH: &str = "/api/azuretts";

#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: String,
    access_code: Option<String>,
}

impl ProxyClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            access_code: None,
        }
    }

    /// Sends `code` as a bearer credential on every request.
    pub fn with_access_code(mut self, code: impl Into<String>) -> Self {
        self.access_code = Some(code.into());
        self
    }

    pub fn endpoint(&self, provider: ProviderKind) -> String {
        let path = match provider {
            ProviderKind::TokenAuth => TOKEN_AUTH_PATH,
            ProviderKind::KeyAuth => KEY_AUTH_PATH,
        };
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl Synthesizer for ProxyClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult {
        let message = match request.provider {
            ProviderKind::TokenAuth => build_markup(&request.text, &request.voice_id, request.rate),
            ProviderKind::KeyAuth => request.text.clone(),
        };
        let body = SpeechRequest {
            message,
            voice: Some(request.voice_id.clone()),
        };

        let mut builder = self.http.post(self.endpoint(request.provider)).json(&body);
        if let Some(code) = &self.access_code {
            builder = builder.bearer_auth(code);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            warn!(status = status.as_u16(), "speech proxy returned an error");
            return Err(TtsError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        let parsed: SpeechResponse = serde_json::from_slice(&bytes)
            .map_err(|e| TtsError::Decode(format!("unexpected proxy response: {}", e)))?;
        Ok(EncodedAudio::new(parsed.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_chosen_by_provider() {
        let client = ProxyClient::new(reqwest::Client::new(), "http://localhost:3000/");
        assert_eq!(
            client.endpoint(ProviderKind::KeyAuth),
            "http://localhost:3000/api/openaitts"
        );
        assert_eq!(
            client.endpoint(ProviderKind::TokenAuth),
            "http://localhost:3000/api/azuretts"
        );
    }
}
