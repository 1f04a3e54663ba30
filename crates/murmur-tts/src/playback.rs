//! Per-message playback with a single cached synthesis result.
//!
//! A [`PlaybackSession`] belongs to one rendered message. It remembers the
//! last synthesized audio together with a fingerprint of everything that
//! produced it, so pressing play again on unchanged content resumes without
//! another provider call. Changing the voice or rate changes the fingerprint,
//! which is recomputed on every attempt; there is no explicit invalidation.
//!
//! # States
//!
//! ```text
//! Idle ──play──▶ Loading ──ok──▶ Playing ◀──play── Paused
//!   ▲               │              │  │               ▲
//!   └────error──────┘              │  └────pause──────┘
//!   ▲                              │
//!   └──────stop / ended────────────┘
//! ```
//!
//! Each attempt that goes to the network takes a new request generation. A
//! response that comes back after a newer attempt (or a stop) has started is
//! stale: its blob is revoked immediately and the session is left alone.

use crate::error::TtsError;
use crate::provider::Synthesizer;
use crate::transcode::{BlobStore, ResourceHandle};
use murmur_types::{PlaybackState, SynthesisRequest, TtsSettings};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Capacity of the state-transition broadcast channel.
const STATE_EVENT_CAPACITY: usize = 32;

/// The audio element a session drives.
pub trait AudioSink: Send {
    /// Replaces the current source.
    fn load(&mut self, source: &ResourceHandle);
    fn play(&mut self);
    fn pause(&mut self);
    /// Moves the playback position back to the start.
    fn rewind(&mut self);
}

#[derive(Debug, Default)]
struct HeadlessState {
    source: Option<ResourceHandle>,
    playing: bool,
    plays: usize,
    rewinds: usize,
}

/// An [`AudioSink`] with no audio device.
///
/// Clones observe the same state, so a host can keep one clone while the
/// session owns another.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSink {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<ResourceHandle> {
        self.lock().source.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    /// Number of times playback was started or resumed.
    pub fn play_count(&self) -> usize {
        self.lock().plays
    }

    pub fn rewind_count(&self) -> usize {
        self.lock().rewinds
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioSink for HeadlessSink {
    fn load(&mut self, source: &ResourceHandle) {
        let mut state = self.lock();
        state.source = Some(source.clone());
        state.playing = false;
    }

    fn play(&mut self) {
        let mut state = self.lock();
        state.playing = true;
        state.plays += 1;
    }

    fn pause(&mut self) {
        self.lock().playing = false;
    }

    fn rewind(&mut self) {
        self.lock().rewinds += 1;
    }
}

/// The cached synthesis result of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub handle: ResourceHandle,
}

/// What a call to [`PlaybackSession::play`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// New audio was synthesized and playback started.
    Started,
    /// Cached audio matched the fingerprint; no request was made.
    Resumed,
    /// The session was already playing.
    AlreadyPlaying,
    /// Empty text, nothing to speak.
    Skipped,
    /// A newer attempt or a stop overtook this one; its result was dropped.
    Superseded,
}

/// Hex SHA-256 over the text and every setting that shapes the audio.
pub fn fingerprint(text: &str, settings: &TtsSettings) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0x1f]);
    hasher.update(settings.provider.brand().as_bytes());
    hasher.update([0x1f]);
    hasher.update(settings.voice_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(settings.rate.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

struct SessionInner {
    state: PlaybackState,
    entry: Option<CacheEntry>,
    generation: u64,
    sink: Box<dyn AudioSink>,
}

/// Playback controller for one message instance.
pub struct PlaybackSession {
    synthesizer: Arc<dyn Synthesizer>,
    blobs: BlobStore,
    inner: Mutex<SessionInner>,
    events: broadcast::Sender<PlaybackState>,
}

impl fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("PlaybackSession")
            .field("state", &inner.state)
            .field("entry", &inner.entry)
            .field("generation", &inner.generation)
            .finish_non_exhaustive()
    }
}

impl PlaybackSession {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        blobs: BlobStore,
        sink: impl AudioSink + 'static,
    ) -> Self {
        let (events, _) = broadcast::channel(STATE_EVENT_CAPACITY);
        Self {
            synthesizer,
            blobs,
            inner: Mutex::new(SessionInner {
                state: PlaybackState::Idle,
                entry: None,
                generation: 0,
                sink: Box::new(sink),
            }),
            events,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.lock().state
    }

    pub fn entry(&self) -> Option<CacheEntry> {
        self.lock().entry.clone()
    }

    /// Receives every state transition from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackState> {
        self.events.subscribe()
    }

    /// Plays `text` with `settings`, reusing the cached audio when the
    /// fingerprint matches.
    ///
    /// # Errors
    ///
    /// Any synthesis or decode failure of the current attempt. The session is
    /// back in `Idle` when an error is returned.
    pub async fn play(&self, text: &str, settings: &TtsSettings) -> Result<PlayOutcome, TtsError> {
        if text.is_empty() {
            return Ok(PlayOutcome::Skipped);
        }

        let fingerprint = fingerprint(text, settings);
        let generation = {
            let mut inner = self.lock();
            if inner.state == PlaybackState::Playing {
                return Ok(PlayOutcome::AlreadyPlaying);
            }

            let cached = inner.entry.as_ref().is_some_and(|entry| {
                entry.fingerprint == fingerprint && self.blobs.resolve(&entry.handle).is_some()
            });
            if cached {
                if inner.state == PlaybackState::Loading {
                    // Resuming abandons whatever request is still in flight.
                    inner.generation += 1;
                }
                inner.sink.play();
                self.transition(&mut inner, PlaybackState::Playing);
                return Ok(PlayOutcome::Resumed);
            }

            inner.generation += 1;
            self.transition(&mut inner, PlaybackState::Loading);
            inner.generation
        };

        let request = SynthesisRequest::from_settings(text, settings);
        let result = match self.synthesizer.synthesize(&request).await {
            Ok(encoded) => self.blobs.decode(&encoded),
            Err(e) => Err(e),
        };

        let mut inner = self.lock();
        if inner.generation != generation {
            if let Ok(handle) = &result {
                self.blobs.revoke(handle);
            }
            debug!(generation, current = inner.generation, "discarding stale synthesis result");
            return Ok(PlayOutcome::Superseded);
        }

        match result {
            Ok(handle) => {
                if let Some(previous) = inner.entry.take() {
                    self.blobs.revoke(&previous.handle);
                }
                inner.sink.load(&handle);
                inner.sink.play();
                inner.entry = Some(CacheEntry {
                    fingerprint,
                    handle,
                });
                self.transition(&mut inner, PlaybackState::Playing);
                Ok(PlayOutcome::Started)
            }
            Err(e) => {
                warn!(error = %e, "speech playback failed");
                self.transition(&mut inner, PlaybackState::Idle);
                Err(e)
            }
        }
    }

    /// Playing → Paused. Other states are left unchanged.
    pub fn pause(&self) -> PlaybackState {
        let mut inner = self.lock();
        if inner.state == PlaybackState::Playing {
            inner.sink.pause();
            self.transition(&mut inner, PlaybackState::Paused);
        }
        inner.state
    }

    /// Returns to `Idle`, resetting the position.
    ///
    /// Stopping while loading abandons the in-flight request: its response
    /// will be discarded when it arrives.
    pub fn stop(&self) -> PlaybackState {
        let mut inner = self.lock();
        match inner.state {
            PlaybackState::Playing | PlaybackState::Paused => {
                inner.sink.pause();
                inner.sink.rewind();
                self.transition(&mut inner, PlaybackState::Idle);
            }
            PlaybackState::Loading => {
                inner.generation += 1;
                self.transition(&mut inner, PlaybackState::Idle);
            }
            PlaybackState::Idle => {}
        }
        inner.state
    }

    /// Called by the sink host when the audio reaches its end.
    pub fn on_ended(&self) -> PlaybackState {
        let mut inner = self.lock();
        if inner.state == PlaybackState::Playing {
            inner.sink.rewind();
            self.transition(&mut inner, PlaybackState::Idle);
        }
        inner.state
    }

    /// The play button: stops while playing, plays otherwise.
    pub async fn toggle(
        &self,
        text: &str,
        settings: &TtsSettings,
    ) -> Result<PlaybackState, TtsError> {
        if self.state() == PlaybackState::Playing {
            return Ok(self.stop());
        }
        self.play(text, settings).await?;
        Ok(self.state())
    }

    fn transition(&self, inner: &mut SessionInner, next: PlaybackState) {
        if inner.state == next {
            return;
        }
        debug!(from = ?inner.state, to = ?next, "playback transition");
        inner.state = next;
        // No subscribers is fine.
        let _ = self.events.send(next);
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = inner.entry.take() {
            self.blobs.revoke(&entry.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SynthesisResult;
    use crate::transcode::encode_audio;
    use async_trait::async_trait;
    use murmur_types::ProviderKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every request with the same bytes and counts calls.
    #[derive(Default)]
    struct CountingSynth {
        calls: AtomicUsize,
        fail_with: Option<u16>,
    }

    #[async_trait]
    impl Synthesizer for CountingSynth {
        async fn synthesize(&self, _request: &SynthesisRequest) -> SynthesisResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(status) => Err(TtsError::Provider {
                    status,
                    message: "rejected".to_string(),
                }),
                None => Ok(encode_audio(&[0x49, 0x44, 0x33])),
            }
        }
    }

    fn session(synth: Arc<CountingSynth>) -> (PlaybackSession, BlobStore, HeadlessSink) {
        let blobs = BlobStore::new();
        let sink = HeadlessSink::new();
        let session = PlaybackSession::new(synth, blobs.clone(), sink.clone());
        (session, blobs, sink)
    }

    #[test]
    fn fingerprint_changes_with_every_parameter() {
        let base = TtsSettings::new(ProviderKind::KeyAuth, "onyx", 1.0);
        let fp = fingerprint("Hello", &base);
        assert_eq!(fp, fingerprint("Hello", &base));
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, hex::encode(Sha256::digest(b"Hello\x1fopenai\x1fonyx\x1f1")));
        assert_ne!(fp, fingerprint("Hello!", &base));
        assert_ne!(fp, fingerprint("Hello", &base.clone().with_rate(1.2)));
        assert_ne!(
            fp,
            fingerprint("Hello", &TtsSettings::new(ProviderKind::KeyAuth, "nova", 1.0))
        );
        assert_ne!(
            fp,
            fingerprint("Hello", &TtsSettings::new(ProviderKind::TokenAuth, "onyx", 1.0))
        );
    }

    #[tokio::test]
    async fn empty_text_is_skipped() {
        let synth = Arc::new(CountingSynth::default());
        let (session, _, _) = session(synth.clone());
        let outcome = session.play("", &TtsSettings::default()).await.unwrap();
        assert_eq!(outcome, PlayOutcome::Skipped);
        assert_eq!(session.state(), PlaybackState::Idle);
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pause_then_play_resumes_without_request() {
        let synth = Arc::new(CountingSynth::default());
        let (session, _, sink) = session(synth.clone());
        let settings = TtsSettings::default();

        assert_eq!(session.play("Hello", &settings).await.unwrap(), PlayOutcome::Started);
        assert_eq!(session.pause(), PlaybackState::Paused);
        assert!(!sink.is_playing());

        assert_eq!(session.play("Hello", &settings).await.unwrap(), PlayOutcome::Resumed);
        assert_eq!(session.state(), PlaybackState::Playing);
        assert!(sink.is_playing());
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn playing_session_ignores_second_play() {
        let synth = Arc::new(CountingSynth::default());
        let (session, _, _) = session(synth.clone());
        let settings = TtsSettings::default();

        session.play("Hello", &settings).await.unwrap();
        let outcome = session.play("Hello", &settings).await.unwrap();
        assert_eq!(outcome, PlayOutcome::AlreadyPlaying);
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_and_end_return_to_idle_with_rewind() {
        let synth = Arc::new(CountingSynth::default());
        let (session, _, sink) = session(synth);
        let settings = TtsSettings::default();

        session.play("Hello", &settings).await.unwrap();
        assert_eq!(session.stop(), PlaybackState::Idle);
        assert_eq!(sink.rewind_count(), 1);

        session.play("Hello", &settings).await.unwrap();
        assert_eq!(session.on_ended(), PlaybackState::Idle);
        assert_eq!(sink.rewind_count(), 2);
        assert!(session.entry().is_some());
    }

    #[tokio::test]
    async fn changed_rate_replaces_the_entry_and_revokes_the_old_blob() {
        let synth = Arc::new(CountingSynth::default());
        let (session, blobs, sink) = session(synth.clone());
        let settings = TtsSettings::default();

        session.play("Hello", &settings).await.unwrap();
        let first = session.entry().unwrap();
        session.stop();

        let faster = settings.with_rate(1.5);
        assert_eq!(session.play("Hello", &faster).await.unwrap(), PlayOutcome::Started);
        let second = session.entry().unwrap();

        assert_ne!(first.fingerprint, second.fingerprint);
        assert!(blobs.resolve(&first.handle).is_none());
        assert!(blobs.resolve(&second.handle).is_some());
        assert_eq!(blobs.len(), 1);
        assert_eq!(sink.source(), Some(second.handle));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failure_returns_to_idle_and_keeps_nothing() {
        let synth = Arc::new(CountingSynth {
            calls: AtomicUsize::new(0),
            fail_with: Some(500),
        });
        let (session, blobs, _) = session(synth);
        let mut events = session.subscribe();

        let err = session
            .play("Hello", &TtsSettings::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(session.entry().is_none());
        assert!(blobs.is_empty());

        assert_eq!(events.try_recv().unwrap(), PlaybackState::Loading);
        assert_eq!(events.try_recv().unwrap(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn toggle_stops_a_playing_session() {
        let synth = Arc::new(CountingSynth::default());
        let (session, _, _) = session(synth);
        let settings = TtsSettings::default();

        assert_eq!(
            session.toggle("Hello", &settings).await.unwrap(),
            PlaybackState::Playing
        );
        assert_eq!(
            session.toggle("Hello", &settings).await.unwrap(),
            PlaybackState::Idle
        );
    }

    #[tokio::test]
    async fn dropping_the_session_revokes_its_blob() {
        let synth = Arc::new(CountingSynth::default());
        let (session, blobs, _) = session(synth);
        session.play("Hello", &TtsSettings::default()).await.unwrap();
        assert_eq!(blobs.len(), 1);
        drop(session);
        assert!(blobs.is_empty());
    }
}
