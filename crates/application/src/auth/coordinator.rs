//! Single-flight refresh coordinator.
//!
//! At most one refresh exchange is outstanding at a time. Callers that
//! arrive while one is running wait for its outcome instead of issuing
//! their own. The exchange runs in its own task, so it always finishes
//! and drains its queue even if the caller that started it goes away.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use warden_domain::{SessionSettings, SessionState, TokenPair, codec, token_preview};

use super::broadcaster::SessionBroadcaster;
use super::flight::{FlightGuard, FlightState, RefreshOutcome, Ticket, Waiter};
use super::token_store::TokenStore;
use crate::error::RefreshFailure;
use crate::ports::{Clock, RefreshClient};

/// Timing knobs for the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Seconds before expiry at which access is treated as expired.
    pub skew_seconds: i64,
    /// Upper bound on one refresh exchange.
    pub refresh_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::from(&SessionSettings::default())
    }
}

impl From<&SessionSettings> for CoordinatorConfig {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            skew_seconds: settings.refresh_skew_seconds,
            refresh_timeout: Duration::from_secs(settings.refresh_timeout_seconds),
        }
    }
}

struct Inner<R> {
    store: TokenStore,
    client: R,
    clock: Arc<dyn Clock>,
    broadcaster: SessionBroadcaster,
    flight: Arc<FlightState>,
    config: CoordinatorConfig,
}

/// Hands out valid access credentials, refreshing at most once at a time.
///
/// Cloning yields another handle to the same coordinator and flight.
pub struct RefreshCoordinator<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for RefreshCoordinator<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: RefreshClient> RefreshCoordinator<R> {
    /// Creates a coordinator.
    #[must_use]
    pub fn new(
        store: TokenStore,
        client: R,
        clock: Arc<dyn Clock>,
        broadcaster: SessionBroadcaster,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                client,
                clock,
                broadcaster,
                flight: Arc::new(FlightState::new()),
                config,
            }),
        }
    }

    /// Returns a usable access credential.
    ///
    /// Returns the stored one without any network call when it is valid
    /// (allowing for skew); otherwise joins or starts a refresh.
    ///
    /// # Errors
    ///
    /// Returns the [`RefreshFailure`] of the refresh. By then the store
    /// has been cleared and session-expired has been broadcast.
    pub async fn ensure_valid_access_token(&self) -> Result<String, RefreshFailure> {
        if let Some(access) = self.usable_access() {
            return Ok(access);
        }
        self.join_refresh(|_| true).await
    }

    /// Starts or joins a refresh even if the stored access looks valid.
    ///
    /// # Errors
    ///
    /// See [`RefreshCoordinator::ensure_valid_access_token`].
    pub async fn refresh_now(&self) -> Result<String, RefreshFailure> {
        self.join_refresh(|_| false).await
    }

    /// Recovers after the backend rejected `rejected`.
    ///
    /// If the store already holds a different, valid access credential
    /// (another caller refreshed meanwhile) it is returned directly;
    /// otherwise a refresh is started or joined.
    ///
    /// # Errors
    ///
    /// See [`RefreshCoordinator::ensure_valid_access_token`].
    pub async fn recover(&self, rejected: Option<&str>) -> Result<String, RefreshFailure> {
        if let Some(access) = self.usable_access()
            && Some(access.as_str()) != rejected
        {
            debug!("access credential already replaced, skipping refresh");
            return Ok(access);
        }
        self.join_refresh(|access| Some(access) != rejected).await
    }

    /// Reports the lifecycle state of the session.
    ///
    /// A stale access credential with a usable refresh credential reads as
    /// `Refreshing`: the next call will refresh it.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        let pair = self.snapshot();
        if pair.is_empty() {
            return SessionState::Unauthenticated;
        }
        if self.inner.flight.in_progress() {
            return SessionState::Refreshing;
        }
        let now = self.inner.clock.now();
        let skew = self.inner.config.skew_seconds;
        if !codec::is_expired(pair.access.as_deref(), skew, now) {
            SessionState::Authenticated
        } else if !codec::is_expired(pair.refresh.as_deref(), 0, now) {
            // Predicted: no flight is running yet, the next call starts one.
            SessionState::Refreshing
        } else {
            SessionState::Expired
        }
    }

    /// Returns true while a refresh exchange is outstanding.
    #[must_use]
    pub fn refresh_in_progress(&self) -> bool {
        self.inner.flight.in_progress()
    }

    /// The token store this coordinator writes to.
    #[must_use]
    pub fn store(&self) -> &TokenStore {
        &self.inner.store
    }

    /// The broadcaster this coordinator publishes to.
    #[must_use]
    pub fn broadcaster(&self) -> &SessionBroadcaster {
        &self.inner.broadcaster
    }

    fn snapshot(&self) -> TokenPair {
        self.inner.store.get().unwrap_or_else(|e| {
            warn!(error = %e, "credential storage unreadable");
            TokenPair::default()
        })
    }

    fn usable_access(&self) -> Option<String> {
        let access = self.snapshot().access?;
        let now = self.inner.clock.now();
        if codec::is_expired(Some(&access), self.inner.config.skew_seconds, now) {
            None
        } else {
            Some(access)
        }
    }

    /// Joins the flight, or leads a new one.
    ///
    /// A new leader first re-reads the store: a flight that finished
    /// between the caller's validity check and `acquire` may already have
    /// stored an access credential accepted by `reusable`.
    async fn join_refresh(&self, reusable: impl Fn(&str) -> bool) -> Result<String, RefreshFailure> {
        let waiter: Waiter = match self.inner.flight.acquire() {
            Ticket::Leader(guard, waiter) => {
                if let Some(access) = self.usable_access().filter(|access| reusable(access.as_str())) {
                    debug!("access credential replaced before refresh started, reusing it");
                    guard.complete(&Ok(access));
                } else {
                    let inner = self.inner.clone();
                    tokio::spawn(async move { inner.run_refresh(guard).await });
                }
                waiter
            }
            Ticket::Follower(waiter) => {
                debug!("joining in-flight refresh");
                waiter
            }
        };
        waiter.await.unwrap_or(Err(RefreshFailure::Aborted))
    }
}

impl<R: RefreshClient> Inner<R> {
    async fn run_refresh(&self, guard: FlightGuard) {
        let outcome = self.exchange().await;

        match &outcome {
            Ok(access) => {
                let waiters = guard.complete(&outcome);
                info!(access = %token_preview(access), waiters, "session refreshed");
            }
            Err(failure) => {
                self.store.clear();
                let waiters = guard.complete(&outcome);
                warn!(error = %failure, waiters, "session refresh failed");
                self.broadcaster.notify(failure.reason());
            }
        }
    }

    async fn exchange(&self) -> RefreshOutcome {
        let refresh = self.store.refresh()?.ok_or_else(RefreshFailure::missing_refresh)?;
        if codec::is_expired(Some(&refresh), 0, self.clock.now()) {
            return Err(RefreshFailure::refresh_expired());
        }

        info!(refresh = %token_preview(&refresh), "refreshing session");
        let grant = tokio::time::timeout(self.config.refresh_timeout, self.client.refresh(&refresh))
            .await
            .map_err(|_| RefreshFailure::TimedOut)??;

        self.store.set(Some(&grant.access), grant.refresh.as_deref())?;
        Ok(grant.access)
    }
}
