//! Shared types for the Murmur text-to-speech layer.
//!
//! This crate provides the foundational types used across the workspace:
//! the provider selector, the per-call synthesis request, the typed TTS
//! settings that replace the browser's loosely-typed settings bag, and the
//! JSON envelopes spoken between the browser client and the proxy endpoints.
//!
//! Nothing in here performs I/O. `murmur-tts` and `murmur-server` both depend
//! on it so the wire format is defined exactly once.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

mod voice;
mod wire;

pub use voice::{TtsSettings, VoiceOption, VoiceSelection, DEFAULT_RATE, VOICE_CATALOG};
pub use wire::{ErrorBody, ErrorEnvelope, SpeechRequest, SpeechResponse};

/// Which upstream speech provider a request is routed to.
///
/// The two variants differ in how they authenticate: `TokenAuth` exchanges a
/// subscription key for a short-lived bearer token and takes a markup
/// document, `KeyAuth` sends a static API key with plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Azure-style provider: bearer token from a token endpoint, SSML body.
    #[serde(rename = "azure")]
    TokenAuth,
    /// OpenAI-style provider: static API key, JSON body.
    #[default]
    #[serde(rename = "openai")]
    KeyAuth,
}

impl ProviderKind {
    /// Returns the brand string persisted by the client (`"azure"` / `"openai"`).
    pub fn brand(self) -> &'static str {
        match self {
            Self::TokenAuth => "azure",
            Self::KeyAuth => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.brand())
    }
}

/// Error returned when a brand string does not name a known provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider brand: {0}")]
pub struct ParseProviderError(pub String);

impl FromStr for ProviderKind {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "azure" => Ok(Self::TokenAuth),
            "openai" => Ok(Self::KeyAuth),
            other => Err(ParseProviderError(other.to_string())),
        }
    }
}

/// A single synthesis call. Built per play attempt and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Plain text to speak.
    pub text: String,
    /// Provider-specific voice identifier.
    pub voice_id: String,
    /// Speaking rate multiplier (1.0 is normal).
    pub rate: f32,
    /// Provider the request is routed to.
    pub provider: ProviderKind,
}

impl SynthesisRequest {
    pub fn new(
        text: impl Into<String>,
        voice_id: impl Into<String>,
        rate: f32,
        provider: ProviderKind,
    ) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            rate,
            provider,
        }
    }

    /// Builds a request for `text` using the voice, rate and provider of `settings`.
    pub fn from_settings(text: impl Into<String>, settings: &TtsSettings) -> Self {
        Self::new(
            text,
            settings.voice_id.clone(),
            settings.rate,
            settings.provider,
        )
    }
}

/// Playback state of one message instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing loaded or playback finished.
    #[default]
    Idle,
    /// A synthesis request is in flight.
    Loading,
    /// Audio is playing.
    Playing,
    /// Audio is loaded and paused mid-way.
    Paused,
}
