//! Provider credentials and endpoint settings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output format requested from the token-authenticated provider.
pub const DEFAULT_OUTPUT_FORMAT: &str = "audio-16khz-32kbitrate-mono-mp3";

fn default_output_format() -> String {
    DEFAULT_OUTPUT_FORMAT.to_string()
}

fn default_openai_host() -> String {
    "https://api.openai.com".to_string()
}

fn default_openai_model() -> String {
    "tts-1-hd".to_string()
}

fn default_openai_voice() -> String {
    "alloy".to_string()
}

/// Credentials and endpoints for the token-authenticated (Azure) provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct AzureSpeechConfig {
    #[serde(default, skip_serializing)]
    pub subscription_key: String,
    /// Service region, e.g. `eastasia`.
    #[serde(default)]
    pub region: String,
    /// Overrides the region-derived token endpoint.
    #[serde(default)]
    pub token_endpoint: Option<String>,
    /// Overrides the region-derived synthesis endpoint.
    #[serde(default)]
    pub synthesis_endpoint: Option<String>,
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

impl fmt::Debug for AzureSpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureSpeechConfig")
            .field("subscription_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("token_endpoint", &self.token_endpoint)
            .field("synthesis_endpoint", &self.synthesis_endpoint)
            .field("output_format", &self.output_format)
            .finish()
    }
}

impl Default for AzureSpeechConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl AzureSpeechConfig {
    pub fn new(subscription_key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            subscription_key: subscription_key.into(),
            region: region.into(),
            token_endpoint: None,
            synthesis_endpoint: None,
            output_format: default_output_format(),
        }
    }

    /// Points both endpoints at explicit URLs instead of the regional hosts.
    pub fn with_endpoints(
        mut self,
        token_endpoint: impl Into<String>,
        synthesis_endpoint: impl Into<String>,
    ) -> Self {
        self.token_endpoint = Some(token_endpoint.into());
        self.synthesis_endpoint = Some(synthesis_endpoint.into());
        self
    }

    pub fn token_url(&self) -> String {
        match &self.token_endpoint {
            Some(url) => url.clone(),
            None => format!(
                "https://{}.api.cognitive.microsoft.com/sts/v1.0/issuetoken",
                self.region
            ),
        }
    }

    pub fn synthesis_url(&self) -> String {
        match &self.synthesis_endpoint {
            Some(url) => url.clone(),
            None => format!(
                "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
                self.region
            ),
        }
    }

    /// A subscription key plus either a region or both explicit endpoints.
    pub fn is_configured(&self) -> bool {
        !self.subscription_key.is_empty()
            && (!self.region.is_empty()
                || (self.token_endpoint.is_some() && self.synthesis_endpoint.is_some()))
    }
}

/// Credentials and endpoint for the key-authenticated (OpenAI) provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiSpeechConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_openai_host")]
    pub host: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    /// Voice used when a request names none.
    #[serde(default = "default_openai_voice")]
    pub default_voice: String,
}

impl Default for OpenAiSpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            host: default_openai_host(),
            model: default_openai_model(),
            default_voice: default_openai_voice(),
        }
    }
}

impl fmt::Debug for OpenAiSpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSpeechConfig")
            .field("api_key", &"[REDACTED]")
            .field("host", &self.host)
            .field("model", &self.model)
            .field("default_voice", &self.default_voice)
            .finish()
    }
}

impl OpenAiSpeechConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn speech_url(&self) -> String {
        format!("{}/v1/audio/speech", self.host.trim_end_matches('/'))
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
