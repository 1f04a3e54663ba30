//! Text-to-speech access layer for chat messages.
//!
//! Two upstream providers are supported: a token-authenticated one that takes
//! SSML documents ([`ProviderKind::TokenAuth`]) and a key-authenticated one
//! that takes plain text ([`ProviderKind::KeyAuth`]). Both return MP3 audio,
//! which travels to the client as base64 and is played from a
//! [`BlobStore`] handle by a per-message [`PlaybackSession`].
//!
//! [`ProviderClient`] holds the provider credentials and is used by the
//! proxy server. [`ProxyClient`] is the client side of that proxy. Both
//! implement [`Synthesizer`], which is what a session drives.

pub mod config;
pub mod error;
pub mod markup;
pub mod playback;
pub mod provider;
pub mod proxy;
pub mod token;
pub mod transcode;

pub use config::{AzureSpeechConfig, OpenAiSpeechConfig, DEFAULT_OUTPUT_FORMAT};
pub use error::{ErrorKind, TtsError};
pub use markup::{build_markup, escape_markup, MARKUP_CONTENT_TYPE};
pub use murmur_types::{PlaybackState, ProviderKind, SynthesisRequest, TtsSettings};
pub use playback::{
    fingerprint, AudioSink, CacheEntry, HeadlessSink, PlayOutcome, PlaybackSession,
};
pub use provider::{http_client, ProviderClient, SynthesisResult, Synthesizer};
pub use proxy::ProxyClient;
pub use token::{Token, TokenCache, TOKEN_TTL};
pub use transcode::{
    decode_audio, encode_audio, AudioBlob, BlobStore, EncodedAudio, ResourceHandle, AUDIO_MIME,
};
