//! Warden Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus settings loading.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod persistence;
pub mod serialization;

pub use adapters::{ReqwestTransport, SystemClock};
pub use auth::HttpRefreshClient;
pub use config::{ConfigError, load_settings, load_settings_with};
pub use persistence::{FileStorage, MemoryStorage};
pub use serialization::{SerializationError, from_json, to_json_stable};
