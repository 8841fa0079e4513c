//! Credential roles and the access/refresh pair.

use serde::{Deserialize, Serialize};

/// The two roles a credential can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialRole {
    /// Short-lived, presented on every authenticated request.
    Access,
    /// Long-lived, presented only to the refresh endpoint.
    Refresh,
}

impl CredentialRole {
    /// Lowercase label used in log fields and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Snapshot of the stored credentials. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Current access credential.
    pub access: Option<String>,
    /// Current refresh credential.
    pub refresh: Option<String>,
}

impl TokenPair {
    /// Creates a pair with both credentials present.
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: Some(access.into()),
            refresh: Some(refresh.into()),
        }
    }

    /// Returns true if neither credential is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }

    /// Returns the credential stored for `role`.
    #[must_use]
    pub fn get(&self, role: CredentialRole) -> Option<&str> {
        match role {
            CredentialRole::Access => self.access.as_deref(),
            CredentialRole::Refresh => self.refresh.as_deref(),
        }
    }
}

/// Preview of a credential safe for logs (first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    match token.char_indices().nth(8) {
        Some((idx, _)) if token.len() > 12 => format!("{}...", &token[..idx]),
        _ => token.to_string(),
    }
}
