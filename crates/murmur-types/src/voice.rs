//! Voice catalog and TTS settings.
//!
//! A `TtsSettings` value is everything that influences the synthesized audio
//! apart from the text itself. The client persists only two keys (brand and
//! voice), modelled here as `VoiceSelection`.

use crate::ProviderKind;
use serde::{Deserialize, Serialize};

/// Speaking rate used when nothing else is configured.
pub const DEFAULT_RATE: f32 = 1.0;

/// A selectable voice in the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceOption {
    /// Label shown to the user.
    pub label: &'static str,
    /// Provider-specific voice identifier.
    pub voice_id: &'static str,
    /// Provider that owns the voice.
    pub provider: ProviderKind,
}

/// Voices offered by the client out of the box.
pub const VOICE_CATALOG: &[VoiceOption] = &[
    VoiceOption {
        label: "Azure-晓晓",
        voice_id: "zh-CN-XiaoxiaoMultilingualNeural",
        provider: ProviderKind::TokenAuth,
    },
    VoiceOption {
        label: "Azure-晓辰",
        voice_id: "zh-CN-XiaochenMultilingualNeural",
        provider: ProviderKind::TokenAuth,
    },
    VoiceOption {
        label: "Azure-晓宇",
        voice_id: "zh-CN-XiaoyuMultilingualNeural",
        provider: ProviderKind::TokenAuth,
    },
    VoiceOption {
        label: "Azure-云逸",
        voice_id: "zh-CN-YunyiMultilingualNeural",
        provider: ProviderKind::TokenAuth,
    },
    VoiceOption {
        label: "Openai-Onyx",
        voice_id: "onyx",
        provider: ProviderKind::KeyAuth,
    },
    VoiceOption {
        label: "Openai-Alloy",
        voice_id: "alloy",
        provider: ProviderKind::KeyAuth,
    },
    VoiceOption {
        label: "Openai-Echo",
        voice_id: "echo",
        provider: ProviderKind::KeyAuth,
    },
    VoiceOption {
        label: "Openai-Fable",
        voice_id: "fable",
        provider: ProviderKind::KeyAuth,
    },
    VoiceOption {
        label: "Openai-Nova",
        voice_id: "nova",
        provider: ProviderKind::KeyAuth,
    },
    VoiceOption {
        label: "Openai-Shimmer",
        voice_id: "shimmer",
        provider: ProviderKind::KeyAuth,
    },
];

impl VoiceOption {
    /// Looks up a catalog entry by voice identifier.
    pub fn find(voice_id: &str) -> Option<&'static VoiceOption> {
        VOICE_CATALOG.iter().find(|v| v.voice_id == voice_id)
    }

    /// First catalog voice belonging to `provider`.
    pub fn default_for(provider: ProviderKind) -> &'static VoiceOption {
        VOICE_CATALOG
            .iter()
            .find(|v| v.provider == provider)
            .unwrap_or(&VOICE_CATALOG[0])
    }
}

/// TTS configuration for one playback attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsSettings {
    pub provider: ProviderKind,
    pub voice_id: String,
    #[serde(default = "default_rate")]
    pub rate: f32,
}

fn default_rate() -> f32 {
    DEFAULT_RATE
}

impl Default for TtsSettings {
    fn default() -> Self {
        let voice = VoiceOption::default_for(ProviderKind::KeyAuth);
        Self {
            provider: voice.provider,
            voice_id: voice.voice_id.to_string(),
            rate: DEFAULT_RATE,
        }
    }
}

impl TtsSettings {
    pub fn new(provider: ProviderKind, voice_id: impl Into<String>, rate: f32) -> Self {
        Self {
            provider,
            voice_id: voice_id.into(),
            rate,
        }
    }

    /// Returns a copy with a different speaking rate.
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }
}

/// The two-key store persisted by the browser client.
///
/// Both keys may be absent on a fresh install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSelection {
    /// `"openai"` or `"azure"`.
    #[serde(rename = "voicebrand", default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Provider voice identifier.
    #[serde(rename = "voicemodel", default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

impl VoiceSelection {
    /// Records the choice of a catalog voice, deriving the brand from the catalog.
    ///
    /// Voices unknown to the catalog are stored without a brand.
    pub fn from_catalog(voice_id: &str) -> Self {
        Self {
            brand: VoiceOption::find(voice_id).map(|v| v.provider.brand().to_string()),
            voice: Some(voice_id.to_string()),
        }
    }

    /// Resolves the stored keys into settings at the given rate.
    ///
    /// Any brand other than `"openai"` routes to the token-authenticated
    /// provider. A missing voice falls back to that provider's first catalog voice.
    pub fn settings(&self, rate: f32) -> TtsSettings {
        if self.brand.is_none() && self.voice.is_none() {
            return TtsSettings::default().with_rate(rate);
        }

        let provider = match self.brand.as_deref() {
            Some(brand) if brand.eq_ignore_ascii_case("openai") => ProviderKind::KeyAuth,
            Some(_) => ProviderKind::TokenAuth,
            None => self
                .voice
                .as_deref()
                .and_then(VoiceOption::find)
                .map(|v| v.provider)
                .unwrap_or(ProviderKind::TokenAuth),
        };
        let voice_id = self
            .voice
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| VoiceOption::default_for(provider).voice_id.to_string());

        TtsSettings::new(provider, voice_id, rate)
    }
}
