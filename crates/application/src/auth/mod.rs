//! Authentication session subsystem.
//!
//! This module provides:
//! - Credential storage over the key/value port
//! - Side-effect-free session health evaluation
//! - Single-flight refresh coordination
//! - Request middleware with retry-once 401 recovery
//! - Session-expired broadcasting

mod broadcaster;
mod coordinator;
mod flight;
mod health;
mod manager;
mod middleware;
mod token_store;

pub use broadcaster::{SessionBroadcaster, SessionExpired, Subscription};
pub use coordinator::{CoordinatorConfig, RefreshCoordinator};
pub use flight::{FlightGuard, FlightState, RefreshOutcome, Ticket};
pub use health::HealthEvaluator;
pub use manager::SessionManager;
pub use middleware::AuthMiddleware;
pub use token_store::{TokenKeys, TokenStore};
