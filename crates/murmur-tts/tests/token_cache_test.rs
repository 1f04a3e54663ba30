mod common;

use axum::http::StatusCode;
use common::{azure_config, StubUpstream};
use murmur_tts::token::SUBSCRIPTION_KEY_HEADER;
use murmur_tts::{TokenCache, TtsError};
use std::time::Duration;

fn cache_for(base: &str) -> TokenCache {
    TokenCache::new(reqwest::Client::new(), azure_config(base).token_url(), "sub-key")
}

#[tokio::test]
async fn test_token_reused_within_ttl() {
    let stub = StubUpstream::new();
    let base = stub.spawn().await;
    let cache = cache_for(&base);

    let first = cache.get_token().await.unwrap();
    let second = cache.get_token().await.unwrap();

    assert_eq!(first.value(), "token-1");
    assert_eq!(second.value(), "token-1");
    assert_eq!(stub.token_calls(), 1);
}

#[tokio::test]
async fn test_token_refreshed_once_after_expiry() {
    let stub = StubUpstream::new();
    let base = stub.spawn().await;
    let cache = cache_for(&base).with_ttl(Duration::from_millis(50));

    assert_eq!(cache.get_token().await.unwrap().value(), "token-1");
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(cache.cached().is_none());

    assert_eq!(cache.get_token().await.unwrap().value(), "token-2");
    assert_eq!(cache.get_token().await.unwrap().value(), "token-2");
    assert_eq!(stub.token_calls(), 2);
}

#[tokio::test]
async fn test_token_request_carries_subscription_key() {
    let stub = StubUpstream::new();
    let base = stub.spawn().await;
    cache_for(&base).get_token().await.unwrap();

    let headers = stub.token_headers().unwrap();
    assert_eq!(headers[SUBSCRIPTION_KEY_HEADER], "sub-key");
    assert_eq!(headers["content-type"], "application/json");
}

#[tokio::test]
async fn test_rejected_token_is_auth_error() {
    let stub = StubUpstream::new().with_token_status(StatusCode::UNAUTHORIZED);
    let base = stub.spawn().await;
    let cache = cache_for(&base);

    let err = cache.get_token().await.unwrap_err();
    assert!(matches!(err, TtsError::Auth { status: 401 }), "got {:?}", err);
    assert!(cache.cached().is_none());

    // Nothing is cached after a failure, so the next call asks again.
    let _ = cache.get_token().await;
    assert_eq!(stub.token_calls(), 2);
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let stub = StubUpstream::new();
    let base = stub.spawn().await;
    let cache = cache_for(&base);

    cache.get_token().await.unwrap();
    cache.invalidate();
    assert!(cache.cached().is_none());
    assert_eq!(cache.get_token().await.unwrap().value(), "token-2");
}
