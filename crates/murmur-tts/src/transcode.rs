//! Transport encoding of audio and the blob table that hands out playable handles.
//!
//! Audio travels between the proxy and the client as a base64 string. On the
//! client it is decoded into an [`AudioBlob`] and registered in a
//! [`BlobStore`], which returns a [`ResourceHandle`] (the equivalent of an
//! object URL). A handle stays resolvable until it is revoked; revoking is
//! the owner's job.

use crate::error::TtsError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// MIME type of the audio returned by both providers.
pub const AUDIO_MIME: &str = "audio/mpeg";

/// Base64 text of an audio payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedAudio(String);

impl EncodedAudio {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

pub fn encode_audio(bytes: &[u8]) -> EncodedAudio {
    EncodedAudio(STANDARD.encode(bytes))
}

/// # Errors
///
/// `TtsError::Decode` if the payload is not valid base64.
pub fn decode_audio(encoded: &EncodedAudio) -> Result<Vec<u8>, TtsError> {
    Ok(STANDARD.decode(encoded.0.trim())?)
}

/// Raw audio plus its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl AudioBlob {
    pub fn mp3(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime: AUDIO_MIME,
        }
    }
}

/// Locator for a blob registered in a [`BlobStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session-lifetime table of playable audio blobs.
///
/// Clones share the same table. Lock acquisitions are brief map operations
/// that never span an `.await`.
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    blobs: Arc<Mutex<HashMap<ResourceHandle, Arc<AudioBlob>>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `encoded` and registers the result as an MP3 blob.
    pub fn decode(&self, encoded: &EncodedAudio) -> Result<ResourceHandle, TtsError> {
        let bytes = decode_audio(encoded)?;
        Ok(self.create_object_url(AudioBlob::mp3(bytes)))
    }

    pub fn create_object_url(&self, blob: AudioBlob) -> ResourceHandle {
        let handle = ResourceHandle(format!("blob:murmur/{}", uuid::Uuid::new_v4()));
        debug!(handle = %handle, bytes = blob.bytes.len(), "registered audio blob");
        self.lock().insert(handle.clone(), Arc::new(blob));
        handle
    }

    pub fn resolve(&self, handle: &ResourceHandle) -> Option<Arc<AudioBlob>> {
        self.lock().get(handle).cloned()
    }

    /// Releases the blob behind `handle`. Returns `false` if it was already gone.
    pub fn revoke(&self, handle: &ResourceHandle) -> bool {
        let removed = self.lock().remove(handle).is_some();
        if removed {
            debug!(handle = %handle, "revoked audio blob");
        }
        removed
    }

    /// Number of live blobs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ResourceHandle, Arc<AudioBlob>>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_restores_arbitrary_bytes() {
        let payloads: [&[u8]; 4] = [b"", &[0x49, 0x44, 0x33], &[0, 255, 128, 10, 13], b"ID3\x04\x00"];
        for bytes in payloads {
            assert_eq!(decode_audio(&encode_audio(bytes)).unwrap(), bytes);
        }
    }

    #[test]
    fn malformed_payload_is_a_decode_error() {
        let err = decode_audio(&EncodedAudio::new("not base64!!")).unwrap_err();
        assert!(matches!(err, TtsError::Decode(_)));
    }

    #[test]
    fn handle_resolves_until_revoked() {
        let store = BlobStore::new();
        let handle = store.decode(&encode_audio(&[0x49, 0x44, 0x33])).unwrap();
        assert!(handle.as_str().starts_with("blob:murmur/"));

        let blob = store.resolve(&handle).unwrap();
        assert_eq!(blob.bytes, vec![0x49, 0x44, 0x33]);
        assert_eq!(blob.mime, AUDIO_MIME);

        assert!(store.revoke(&handle));
        assert!(store.resolve(&handle).is_none());
        assert!(!store.revoke(&handle));
        assert!(store.is_empty());
    }

    #[test]
    fn clones_share_the_table() {
        let store = BlobStore::new();
        let other = store.clone();
        let handle = store.create_object_url(AudioBlob::mp3(vec![1, 2, 3]));
        assert_eq!(other.len(), 1);
        assert!(other.revoke(&handle));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn handles_are_unique() {
        let store = BlobStore::new();
        let a = store.create_object_url(AudioBlob::mp3(vec![1]));
        let b = store.create_object_url(AudioBlob::mp3(vec![1]));
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }
}
