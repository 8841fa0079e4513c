//! Warden Application - Session coordination and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for storage, clock and HTTP)
//! - The session subsystem: token store, health, refresh coordinator,
//!   middleware and broadcaster
//! - Application-level error handling

pub mod auth;
pub mod error;
pub mod ports;

#[cfg(test)]
mod testing;

pub use auth::{
    AuthMiddleware, CoordinatorConfig, HealthEvaluator, RefreshCoordinator, SessionBroadcaster,
    SessionExpired, SessionManager, Subscription, TokenKeys, TokenStore,
};
pub use error::{ApplicationError, ApplicationResult, RefreshFailure};
pub use ports::{
    Clock, HttpTransport, KeyValueStorage, ManualClock, RefreshClient, RefreshGrant,
    StorageError, TransportError,
};
