//! Token codec.
//!
//! Reads the claims a backend embeds in a signed credential
//! (`header.payload.signature`, payload is base64url JSON). The signature
//! is not verified here: the client only needs the lifetime the server
//! wrote into the credential, and the backend re-verifies on every call.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Claims read from a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject identity (`sub`), if present.
    pub subject: Option<String>,
    /// Issued-at time (`iat`), if present.
    pub issued_at: Option<DateTime<Utc>>,
    /// Expiry time (`exp`). Mandatory.
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// Creates claims with only an expiry.
    #[must_use]
    pub const fn expiring_at(expires_at: DateTime<Utc>) -> Self {
        Self {
            subject: None,
            issued_at: None,
            expires_at,
        }
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the issued-at time.
    #[must_use]
    pub const fn with_issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    /// Whole seconds between `now` and expiry. Negative once expired.
    #[must_use]
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RawClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

/// Decodes the claims of `credential`.
///
/// # Errors
///
/// Returns a [`DecodeError`] when the credential is not three dot-separated
/// segments, the payload is not base64url JSON, or `exp` is missing.
pub fn decode(credential: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = credential.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::MissingSegment(segments.len()));
    }

    // Some issuers pad the segment; base64url JWTs normally don't.
    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    let raw: RawClaims =
        serde_json::from_slice(&bytes).map_err(|e| DecodeError::Json(e.to_string()))?;

    let exp = raw.exp.ok_or(DecodeError::MissingClaim("exp"))?;
    let expires_at =
        DateTime::from_timestamp(exp, 0).ok_or(DecodeError::InvalidTimestamp("exp"))?;
    let issued_at = raw
        .iat
        .map(|iat| DateTime::from_timestamp(iat, 0).ok_or(DecodeError::InvalidTimestamp("iat")))
        .transpose()?;

    Ok(Claims {
        subject: raw.sub,
        issued_at,
        expires_at,
    })
}

/// Returns true if the credential must not be used at `now`.
///
/// A missing credential or one that fails to decode counts as expired.
/// `skew_seconds` moves the effective expiry earlier so a refresh can
/// finish before the backend starts rejecting the credential.
#[must_use]
pub fn is_expired(credential: Option<&str>, skew_seconds: i64, now: DateTime<Utc>) -> bool {
    let Some(credential) = credential else {
        return true;
    };
    decode(credential).map_or(true, |claims| {
        claims.expires_at - chrono::Duration::seconds(skew_seconds) <= now
    })
}

/// Seconds until the credential expires, or `None` if it does not decode.
#[must_use]
pub fn seconds_remaining(credential: &str, now: DateTime<Utc>) -> Option<i64> {
    decode(credential)
        .ok()
        .map(|claims| claims.seconds_remaining(now))
}

/// Builds an unsigned credential carrying `claims`.
///
/// The signature segment is a fixed placeholder. Useful for fixtures and
/// local backends; nothing in this crate verifies signatures.
#[must_use]
pub fn encode_unsigned(claims: &Claims) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let raw = RawClaims {
        sub: claims.subject.clone(),
        iat: claims.issued_at.map(|t| t.timestamp()),
        exp: Some(claims.expires_at.timestamp()),
    };
    let payload = serde_json::to_vec(&raw).unwrap_or_default();
    format!("{header}.{}.unsigned", URL_SAFE_NO_PAD.encode(payload))
}
