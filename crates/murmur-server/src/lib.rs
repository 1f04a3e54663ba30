//! Murmur speech proxy server library logic.

pub mod api;
pub mod api_tts;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::Config;
use murmur_tts::{http_client, ProviderClient, ProviderKind, TokenCache};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Maximum accepted request body.
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upstream speech providers.
    pub providers: ProviderClient,
    /// Shared access code; `None` disables the check.
    pub access_code: Option<String>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("providers", &self.providers)
            .field("access_code", &self.access_code.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AppState {
    /// Builds the provider client from configuration.
    ///
    /// A provider whose credentials are empty is left out; its endpoint
    /// then answers `503`.
    pub fn from_config(config: &Config) -> Self {
        let http = http_client(config.tts.request_timeout());
        let mut providers = ProviderClient::new(http.clone());

        if config.azure.is_configured() {
            let tokens = TokenCache::new(
                http.clone(),
                config.azure.token_url(),
                config.azure.subscription_key.clone(),
            )
            .with_ttl(config.tts.token_ttl());
            providers = providers.with_token_auth(config.azure.clone(), Arc::new(tokens));
        }
        if config.openai.is_configured() {
            providers = providers.with_key_auth(config.openai.clone());
        }

        for kind in [ProviderKind::KeyAuth, ProviderKind::TokenAuth] {
            if providers.is_configured(kind) {
                tracing::info!(provider = %kind, "speech provider enabled");
            } else {
                tracing::warn!(provider = %kind, "speech provider not configured");
            }
        }

        Self {
            providers,
            access_code: config.access.required_code().map(str::to_string),
        }
    }
}

/// Health check handler.
///
/// Returns `200 OK` with server status and version.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let speech_routes = Router::new()
        .route("/api/openaitts", post(api_tts::openai_tts_handler))
        .route("/api/azuretts", post(api_tts::azure_tts_handler))
        .layer(axum::middleware::from_fn(middleware::access_code_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(speech_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
