//! Domain error types

use thiserror::Error;

/// Failure to read the claims embedded in a credential.
///
/// A credential that fails to decode is always treated as expired by
/// callers, never as valid.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The credential does not have the `header.payload.signature` shape.
    #[error("malformed credential: expected 3 segments, found {0}")]
    MissingSegment(usize),

    /// The claim segment is not valid base64url.
    #[error("claim segment is not valid base64: {0}")]
    Base64(String),

    /// The claim segment is not a JSON object with the expected fields.
    #[error("claim segment is not valid JSON: {0}")]
    Json(String),

    /// A mandatory claim is absent.
    #[error("missing claim: {0}")]
    MissingClaim(&'static str),

    /// A timestamp claim is outside the representable range.
    #[error("claim {0} is not a valid timestamp")]
    InvalidTimestamp(&'static str),
}

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A credential could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A header name or value is not acceptable.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// A session setting is out of range.
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
