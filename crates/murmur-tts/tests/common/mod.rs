#![allow(dead_code)]

//! Stub upstream speech providers served on an ephemeral port.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use murmur_tts::{AzureSpeechConfig, OpenAiSpeechConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ID3: [u8; 3] = [0x49, 0x44, 0x33];

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Clone)]
pub struct StubUpstream {
    token_status: StatusCode,
    synth_status: StatusCode,
    delay: Duration,
    audio: Vec<u8>,
    token_calls: Arc<AtomicUsize>,
    synth_calls: Arc<AtomicUsize>,
    token_headers: Arc<Mutex<Option<HeaderMap>>>,
    last_synthesis: Arc<Mutex<Option<Recorded>>>,
}

impl StubUpstream {
    pub fn new() -> Self {
        Self {
            token_status: StatusCode::OK,
            synth_status: StatusCode::OK,
            delay: Duration::ZERO,
            audio: ID3.to_vec(),
            token_calls: Arc::new(AtomicUsize::new(0)),
            synth_calls: Arc::new(AtomicUsize::new(0)),
            token_headers: Arc::new(Mutex::new(None)),
            last_synthesis: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_token_status(mut self, status: StatusCode) -> Self {
        self.token_status = status;
        self
    }

    pub fn with_synth_status(mut self, status: StatusCode) -> Self {
        self.synth_status = status;
        self
    }

    /// Holds every synthesis response back for `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Serves the stub and returns its base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/sts/v1.0/issuetoken", post(issue_token))
            .route("/cognitiveservices/v1", post(synthesize))
            .route("/v1/audio/speech", post(synthesize))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn synth_calls(&self) -> usize {
        self.synth_calls.load(Ordering::SeqCst)
    }

    pub fn token_headers(&self) -> Option<HeaderMap> {
        self.token_headers.lock().unwrap().clone()
    }

    pub fn last_synthesis(&self) -> Option<Recorded> {
        self.last_synthesis.lock().unwrap().clone()
    }
}

async fn issue_token(State(stub): State<StubUpstream>, headers: HeaderMap) -> Response {
    let n = stub.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
    *stub.token_headers.lock().unwrap() = Some(headers);
    if !stub.token_status.is_success() {
        return (stub.token_status, "access denied").into_response();
    }
    (StatusCode::OK, format!("token-{}", n)).into_response()
}

async fn synthesize(
    State(stub): State<StubUpstream>,
    uri: axum::http::Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    stub.synth_calls.fetch_add(1, Ordering::SeqCst);
    *stub.last_synthesis.lock().unwrap() = Some(Recorded {
        path: uri.path().to_string(),
        headers,
        body,
    });
    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }
    if !stub.synth_status.is_success() {
        return (stub.synth_status, "rate limited").into_response();
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        stub.audio.clone(),
    )
        .into_response()
}

pub fn azure_config(base: &str) -> AzureSpeechConfig {
    AzureSpeechConfig::new("sub-key", "").with_endpoints(
        format!("{}/sts/v1.0/issuetoken", base),
        format!("{}/cognitiveservices/v1", base),
    )
}

pub fn openai_config(base: &str) -> OpenAiSpeechConfig {
    OpenAiSpeechConfig::new("sk-test").with_host(base)
}
