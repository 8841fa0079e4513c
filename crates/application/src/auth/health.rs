//! Session health evaluation.
//!
//! Pure with respect to the token store snapshot: no I/O beyond reading
//! the store, no mutation, and never triggers a refresh.

use std::sync::Arc;

use tracing::warn;
use warden_domain::{SessionHealth, SessionStatus, TokenPair, codec};

use super::token_store::TokenStore;
use crate::ports::Clock;

/// Derives a [`SessionHealth`] from the current credentials.
#[derive(Clone)]
pub struct HealthEvaluator {
    store: TokenStore,
    clock: Arc<dyn Clock>,
    warning_threshold_seconds: i64,
}

impl std::fmt::Debug for HealthEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthEvaluator")
            .field("warning_threshold_seconds", &self.warning_threshold_seconds)
            .finish_non_exhaustive()
    }
}

impl HealthEvaluator {
    /// Creates an evaluator.
    ///
    /// `warning_threshold_seconds` is independent of the backend's token
    /// lifetime.
    #[must_use]
    pub fn new(store: TokenStore, clock: Arc<dyn Clock>, warning_threshold_seconds: i64) -> Self {
        Self {
            store,
            clock,
            warning_threshold_seconds,
        }
    }

    /// Evaluates the session as of now.
    ///
    /// Unreadable storage is reported as unauthenticated.
    #[must_use]
    pub fn evaluate(&self) -> SessionHealth {
        let pair = self.store.get().unwrap_or_else(|e| {
            warn!(error = %e, "credential storage unreadable during health check");
            TokenPair::default()
        });
        self.evaluate_pair(&pair)
    }

    /// Evaluates a given snapshot. First match wins.
    #[must_use]
    pub fn evaluate_pair(&self, pair: &TokenPair) -> SessionHealth {
        if pair.is_empty() {
            return SessionHealth::new(SessionStatus::Unauthenticated, None);
        }

        let now = self.clock.now();
        let remaining = pair
            .access
            .as_deref()
            .and_then(|access| codec::seconds_remaining(access, now));

        match remaining {
            Some(secs) if secs > self.warning_threshold_seconds => {
                SessionHealth::new(SessionStatus::Healthy, Some(secs))
            }
            Some(secs) if secs > 0 => SessionHealth::new(SessionStatus::ExpiringSoon, Some(secs)),
            Some(secs) => SessionHealth::new(SessionStatus::Expired, Some(secs)),
            None => SessionHealth::new(SessionStatus::Expired, None),
        }
    }
}
