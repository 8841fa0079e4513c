//! Session manager: one handle over the whole subsystem.
//!
//! Builds the token store, health evaluator, coordinator, broadcaster and
//! middleware from one [`SessionSettings`] and exposes the operations
//! application code needs.

use std::sync::Arc;

use tracing::info;
use warden_domain::{ApiRequest, ApiResponse, SessionHealth, SessionSettings, SessionState};

use super::broadcaster::{SessionBroadcaster, SessionExpired, Subscription};
use super::coordinator::{CoordinatorConfig, RefreshCoordinator};
use super::health::HealthEvaluator;
use super::middleware::AuthMiddleware;
use super::token_store::{TokenKeys, TokenStore};
use crate::error::{ApplicationResult, RefreshFailure};
use crate::ports::{Clock, HttpTransport, KeyValueStorage, RefreshClient, StorageError};

/// Façade over the session subsystem.
pub struct SessionManager<T, R> {
    store: TokenStore,
    health: HealthEvaluator,
    coordinator: RefreshCoordinator<R>,
    middleware: AuthMiddleware<T, R>,
}

impl<T: HttpTransport, R: RefreshClient> SessionManager<T, R> {
    /// Wires the subsystem together.
    #[must_use]
    pub fn new(
        settings: &SessionSettings,
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        transport: T,
        refresh_client: R,
    ) -> Self {
        let store = TokenStore::with_keys(storage, TokenKeys::from(settings));
        let health = HealthEvaluator::new(
            store.clone(),
            clock.clone(),
            settings.warning_threshold_seconds,
        );
        let coordinator = RefreshCoordinator::new(
            store.clone(),
            refresh_client,
            clock,
            SessionBroadcaster::new(),
            CoordinatorConfig::from(settings),
        );
        let middleware = AuthMiddleware::new(transport, coordinator.clone());
        Self {
            store,
            health,
            coordinator,
            middleware,
        }
    }

    /// Stores the credentials produced by an external login exchange.
    ///
    /// # Errors
    /// Returns an error if the storage cannot be written.
    pub fn login(&self, access: &str, refresh: Option<&str>) -> Result<(), StorageError> {
        self.store.set(Some(access), refresh)?;
        info!("session started");
        Ok(())
    }

    /// Ends the session: clears the store first, then broadcasts `reason`.
    pub fn logout(&self, reason: &str) {
        self.store.clear();
        self.coordinator.broadcaster().notify(reason);
    }

    /// Side-effect-free health report for display.
    #[must_use]
    pub fn health(&self) -> SessionHealth {
        self.health.evaluate()
    }

    /// Lifecycle state of the session.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.coordinator.session_state()
    }

    /// Registers a session-expired listener.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SessionExpired) + Send + Sync + 'static,
    {
        self.coordinator.broadcaster().subscribe(handler)
    }

    /// See [`RefreshCoordinator::ensure_valid_access_token`].
    ///
    /// # Errors
    /// Returns the refresh failure shared by every waiter.
    pub async fn ensure_valid_access_token(&self) -> Result<String, RefreshFailure> {
        self.coordinator.ensure_valid_access_token().await
    }

    /// See [`AuthMiddleware::execute`].
    ///
    /// # Errors
    /// Returns an error if the transport produced no response.
    pub async fn execute(&self, request: ApiRequest) -> ApplicationResult<ApiResponse> {
        self.middleware.execute(request).await
    }

    /// The underlying token store.
    #[must_use]
    pub const fn store(&self) -> &TokenStore {
        &self.store
    }

    /// The underlying coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &RefreshCoordinator<R> {
        &self.coordinator
    }

    /// The underlying middleware.
    #[must_use]
    pub const fn middleware(&self) -> &AuthMiddleware<T, R> {
        &self.middleware
    }
}
