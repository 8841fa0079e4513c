//! Warden Domain - Core session types
//!
//! This crate defines the domain model for the Warden session coordinator.
//! All types here are pure Rust with no I/O dependencies.

pub mod codec;
pub mod credential;
pub mod error;
pub mod http;
pub mod session;
pub mod settings;

pub use codec::{Claims, decode, encode_unsigned, is_expired, seconds_remaining};
pub use credential::{CredentialRole, TokenPair, token_preview};
pub use error::{DecodeError, DomainError, DomainResult};
pub use http::{ApiRequest, ApiResponse, HttpMethod};
pub use session::{SessionHealth, SessionState, SessionStatus};
pub use settings::SessionSettings;
