//! Application error types

use thiserror::Error;
use warden_domain::DomainError;

use crate::ports::{StorageError, TransportError};

/// Why a refresh attempt failed.
///
/// Cloned once per waiter, so every caller queued on one refresh sees
/// the same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshFailure {
    /// The refresh credential was refused, either by the backend or
    /// locally because it is missing or expired.
    #[error("{reason}")]
    Rejected {
        /// HTTP status when the backend answered.
        status: Option<u16>,
        /// Short reason, also used as the broadcast reason.
        reason: String,
    },

    /// No response was received from the refresh endpoint.
    #[error("refresh transport failure: {message}")]
    Transport {
        /// Transport error description.
        message: String,
    },

    /// The refresh exchange exceeded its time bound.
    #[error("refresh timed out")]
    TimedOut,

    /// The new credentials could not be persisted.
    #[error("credential storage failure: {message}")]
    Storage {
        /// Storage error description.
        message: String,
    },

    /// The refresh task ended without reporting an outcome.
    #[error("refresh aborted")]
    Aborted,
}

impl RefreshFailure {
    /// Local rejection: the refresh credential is past its expiry.
    #[must_use]
    pub fn refresh_expired() -> Self {
        Self::Rejected {
            status: None,
            reason: "refresh token expired".to_string(),
        }
    }

    /// Local rejection: no refresh credential is stored.
    #[must_use]
    pub fn missing_refresh() -> Self {
        Self::Rejected {
            status: None,
            reason: "refresh token missing".to_string(),
        }
    }

    /// The backend answered the exchange with a non-2xx status.
    #[must_use]
    pub fn rejected_by_server(status: u16) -> Self {
        Self::Rejected {
            status: Some(status),
            reason: "refresh rejected".to_string(),
        }
    }

    /// Reason string broadcast to session-expired listeners.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Rejected { reason, .. } => reason,
            Self::Transport { .. } => "refresh transport failure",
            Self::TimedOut => "refresh timed out",
            Self::Storage { .. } => "credential storage failure",
            Self::Aborted => "refresh aborted",
        }
    }

    /// Returns true if no response was received from the backend.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::TimedOut)
    }
}

impl From<StorageError> for RefreshFailure {
    fn from(e: StorageError) -> Self {
        Self::Storage {
            message: e.to_string(),
        }
    }
}

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The request produced no response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The session could not be refreshed.
    #[error("refresh failed: {0}")]
    Refresh(#[from] RefreshFailure),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
