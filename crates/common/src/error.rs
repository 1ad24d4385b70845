//! Error taxonomy shared by every socialite crate.

use thiserror::Error;

use crate::types::ProviderKind;

/// Coarse classification of a [`SocialError`], for callers that only care
/// about where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The provider answered with a structured error, or with a body we could not use.
    Provider,
    /// The caller handed us something unusable.
    InvalidArgument,
    /// Network or HTTP-level failure.
    Transport,
    /// The operation does not exist for this provider.
    Unsupported,
    /// Configuration could not be loaded.
    Config,
}

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("{provider} error {code}: {message}")]
    Provider {
        provider: ProviderKind,
        message: String,
        code: i64,
    },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("callback state does not match the stored state")]
    InvalidState,

    #[error("no access token: exchange a code first or pass one explicitly")]
    NotAuthenticated,

    #[error("{provider} response is missing `{field}`")]
    MalformedResponse {
        provider: ProviderKind,
        field: &'static str,
    },

    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: ProviderKind,
        operation: &'static str,
    },

    #[error("HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {message}")]
    Config { message: String },
}

impl SocialError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Provider { .. } | Self::MalformedResponse { .. } | Self::Json(_) => {
                ErrorKind::Provider
            },
            Self::InvalidArgument { .. } | Self::InvalidState | Self::NotAuthenticated => {
                ErrorKind::InvalidArgument
            },
            Self::UnexpectedStatus { .. } | Self::Transport(_) => ErrorKind::Transport,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Provider error code, when the provider reported one.
    #[must_use]
    pub fn provider_code(&self) -> Option<i64> {
        match self {
            Self::Provider { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type SocialResult<T> = Result<T, SocialError>;
