//! Refresh endpoint port

use std::future::Future;

use crate::error::RefreshFailure;

/// Credentials returned by a successful refresh exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshGrant {
    /// New access credential.
    pub access: String,
    /// Replacement refresh credential, when the backend rotates it.
    pub refresh: Option<String>,
}

/// Port for the backend's refresh exchange.
///
/// Implementations perform exactly one network call per invocation and
/// never retry on their own.
pub trait RefreshClient: Send + Sync + 'static {
    /// Exchanges `refresh` for a new access credential.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshFailure::Rejected`] for any non-2xx response and
    /// [`RefreshFailure::Transport`] when no response was received.
    fn refresh(
        &self,
        refresh: &str,
    ) -> impl Future<Output = Result<RefreshGrant, RefreshFailure>> + Send;
}
