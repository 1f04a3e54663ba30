//! Short-lived bearer token cache for the token-authenticated provider.
//!
//! The provider issues tokens in exchange for a subscription key. Tokens are
//! reused until a monotonic deadline passes, then replaced by a fresh fetch.
//! There is no retry, and concurrent callers that observe an expired token
//! may each issue their own refresh: the lock is never held across the
//! network call.

use crate::error::TtsError;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long an issued token is trusted.
pub const TOKEN_TTL: Duration = Duration::from_secs(20);

/// Header carrying the subscription key on token requests.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// A bearer token and the instant after which it must not be handed out.
#[derive(Clone)]
pub struct Token {
    value: String,
    expires_at: Instant,
}

impl Token {
    pub fn new(value: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// A token is usable strictly before its deadline.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Caches one provider's bearer token.
pub struct TokenCache {
    http: reqwest::Client,
    endpoint: String,
    subscription_key: String,
    ttl: Duration,
    current: RwLock<Option<Token>>,
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("endpoint", &self.endpoint)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCache {
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        subscription_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            subscription_key: subscription_key.into(),
            ttl: TOKEN_TTL,
            current: RwLock::new(None),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached token, fetching a new one if none is live.
    ///
    /// # Errors
    ///
    /// `TtsError::Auth` when the token endpoint answers with a non-success
    /// status, `TtsError::Network` when it cannot be reached.
    pub async fn get_token(&self) -> Result<Token, TtsError> {
        if let Some(token) = self.cached() {
            return Ok(token);
        }

        let token = self.fetch().await?;
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(token)
    }

    /// Returns the cached token if it is still before its deadline.
    pub fn cached(&self) -> Option<Token> {
        let now = Instant::now();
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|t| t.is_valid_at(now))
            .cloned()
    }

    /// Drops the cached token so the next call fetches a fresh one.
    pub fn invalidate(&self) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    async fn fetch(&self) -> Result<Token, TtsError> {
        debug!(endpoint = %self.endpoint, "requesting speech token");

        let response = self
            .http
            .post(&self.endpoint)
            .header(SUBSCRIPTION_KEY_HEADER, &self.subscription_key)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "token endpoint refused request");
            return Err(TtsError::Auth {
                status: status.as_u16(),
            });
        }

        let value = response.text().await?;
        Ok(Token::new(value, Instant::now() + self.ttl))
    }
}
