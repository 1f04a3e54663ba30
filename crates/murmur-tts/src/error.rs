use murmur_types::ProviderKind;
use thiserror::Error;

/// Failure of any operation in the speech layer.
///
/// Every variant is recoverable by the caller: a failed play attempt simply
/// returns the session to idle and waits for the next user action.
#[derive(Error, Debug)]
pub enum TtsError {
    /// The token endpoint refused to issue a bearer token.
    #[error("token issuance failed with status {status}")]
    Auth { status: u16 },

    /// The synthesis endpoint answered with a non-success status.
    #[error("speech provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// An encoded audio payload could not be decoded.
    #[error("malformed audio payload: {0}")]
    Decode(String),

    /// The request never produced an HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// The requested provider has no credentials configured.
    #[error("speech provider '{0}' is not configured")]
    NotConfigured(ProviderKind),
}

/// Coarse classification of a [`TtsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Provider,
    Decode,
    Network,
    NotConfigured,
}

impl TtsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Provider { .. } => ErrorKind::Provider,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Network(_) => ErrorKind::Network,
            Self::NotConfigured(_) => ErrorKind::NotConfigured,
        }
    }

    /// Upstream HTTP status, when the failure carried one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Auth { status } | Self::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

impl From<base64::DecodeError> for TtsError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Decode(e.to_string())
    }
}
