//! Speech provider clients.
//!
//! [`ProviderClient`] talks to the upstream providers directly. It carries at
//! most one backend per [`ProviderKind`]; asking for a kind without a backend
//! yields `TtsError::NotConfigured`. Each call issues exactly one synthesis
//! request (plus a token request when the token cache is cold) and buffers
//! the whole audio body before encoding it.

use crate::config::{AzureSpeechConfig, OpenAiSpeechConfig};
use crate::error::TtsError;
use crate::markup::{build_markup, MARKUP_CONTENT_TYPE};
use crate::token::TokenCache;
use crate::transcode::{encode_audio, EncodedAudio};
use async_trait::async_trait;
use murmur_types::{ProviderKind, SynthesisRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Header selecting the audio container of the token-authenticated provider.
pub const OUTPUT_FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";

/// Upstream error bodies are cut to this many characters before being surfaced.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Outcome of a synthesis call.
pub type SynthesisResult = Result<EncodedAudio, TtsError>;

/// Anything that can turn a [`SynthesisRequest`] into encoded audio.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult;
}

/// Builds the shared HTTP client used for provider calls.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("murmur/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

#[derive(Debug)]
struct TokenAuthBackend {
    config: AzureSpeechConfig,
    tokens: Arc<TokenCache>,
}

/// Direct client for both upstream providers.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    token_auth: Option<Arc<TokenAuthBackend>>,
    key_auth: Option<Arc<OpenAiSpeechConfig>>,
}

impl ProviderClient {
    /// Creates a client with no providers configured.
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            token_auth: None,
            key_auth: None,
        }
    }

    /// Enables the token-authenticated provider, sharing `tokens` for bearer tokens.
    pub fn with_token_auth(mut self, config: AzureSpeechConfig, tokens: Arc<TokenCache>) -> Self {
        self.token_auth = Some(Arc::new(TokenAuthBackend { config, tokens }));
        self
    }

    /// Enables the key-authenticated provider.
    pub fn with_key_auth(mut self, config: OpenAiSpeechConfig) -> Self {
        self.key_auth = Some(Arc::new(config));
        self
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::TokenAuth => self.token_auth.is_some(),
            ProviderKind::KeyAuth => self.key_auth.is_some(),
        }
    }

    /// Sends an already-built SSML document to the token-authenticated provider.
    pub async fn synthesize_markup(&self, markup: &str) -> SynthesisResult {
        let backend = self
            .token_auth
            .as_ref()
            .ok_or(TtsError::NotConfigured(ProviderKind::TokenAuth))?;

        let token = backend.tokens.get_token().await?;

        let response = self
            .http
            .post(backend.config.synthesis_url())
            .bearer_auth(token.value())
            .header("Content-Type", MARKUP_CONTENT_TYPE)
            .header(OUTPUT_FORMAT_HEADER, &backend.config.output_format)
            .body(markup.to_string())
            .send()
            .await?;

        read_audio(response, ProviderKind::TokenAuth).await
    }

    /// Sends plain text to the key-authenticated provider.
    ///
    /// A missing or empty `voice` uses the configured default voice.
    pub async fn synthesize_text(&self, text: &str, voice: Option<&str>) -> SynthesisResult {
        let config = self
            .key_auth
            .as_ref()
            .ok_or(TtsError::NotConfigured(ProviderKind::KeyAuth))?;

        let voice = voice
            .filter(|v| !v.is_empty())
            .unwrap_or(&config.default_voice);
        let body = serde_json::json!({
            "model": config.model,
            "input": text,
            "voice": voice,
        });

        let response = self
            .http
            .post(config.speech_url())
            .bearer_auth(&config.api_key)
            .json(&body)
            .send()
            .await?;

        read_audio(response, ProviderKind::KeyAuth).await
    }
}

#[async_trait]
impl Synthesizer for ProviderClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult {
        match request.provider {
            ProviderKind::TokenAuth => {
                let markup = build_markup(&request.text, &request.voice_id, request.rate);
                self.synthesize_markup(&markup).await
            }
            ProviderKind::KeyAuth => {
                self.synthesize_text(&request.text, Some(&request.voice_id))
                    .await
            }
        }
    }
}

async fn read_audio(response: reqwest::Response, provider: ProviderKind) -> SynthesisResult {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        warn!(
            provider = %provider,
            status = status.as_u16(),
            "speech synthesis rejected"
        );
        return Err(TtsError::Provider {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response.bytes().await?;
    info!(provider = %provider, bytes = bytes.len(), "speech synthesized");
    Ok(encode_audio(&bytes))
}
