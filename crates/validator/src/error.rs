//! Error types.
//!
//! Only registry misuse is returned as an `Err` to callers. Everything that
//! goes wrong while a rule runs is turned into a failed outcome instead; a
//! [`PredicateError`] is what custom predicates and the remote client report
//! before that conversion happens.

use std::time::Duration;

/// Misuse of the custom rule registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("custom rule key must be a non-empty string")]
    EmptyKey,

    #[error("custom rule `{key}` is already registered")]
    DuplicateKey { key: String },
}

impl RegistryError {
    #[must_use]
    pub fn category(&self) -> &str {
        "registry"
    }

    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::EmptyKey => "REGISTRY_EMPTY_KEY",
            Self::DuplicateKey { .. } => "REGISTRY_DUPLICATE_KEY",
        }
    }
}

/// A predicate or remote call that could not produce a verdict.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredicateError {
    /// The predicate reported its own failure.
    #[error("{reason}")]
    Failed { reason: String },

    #[error("predicate panicked: {reason}")]
    Panicked { reason: String },

    #[error("timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("request failed: {reason}")]
    Transport { reason: String },

    #[error("endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("undecodable response: {reason}")]
    Decode { reason: String },
}

impl PredicateError {
    /// Shorthand for [`PredicateError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn category(&self) -> &str {
        match self {
            Self::Failed { .. } | Self::Panicked { .. } => "predicate",
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } | Self::Status { .. } | Self::Decode { .. } => "remote",
        }
    }

    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Failed { .. } => "PREDICATE_FAILED",
            Self::Panicked { .. } => "PREDICATE_PANICKED",
            Self::Timeout { .. } => "PREDICATE_TIMEOUT",
            Self::Transport { .. } => "REMOTE_TRANSPORT",
            Self::Status { .. } => "REMOTE_STATUS",
            Self::Decode { .. } => "REMOTE_DECODE",
        }
    }

    /// Whether trying again later could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::Status { status } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for PredicateError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            Self::Decode {
                reason: err.to_string(),
            }
        } else {
            Self::Transport {
                reason: err.to_string(),
            }
        }
    }
}
