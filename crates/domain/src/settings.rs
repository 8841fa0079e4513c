//! Session settings.
//!
//! Every field has a default so a partial settings file deserializes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Tunables for the session coordinator and its adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Backend base URL.
    pub base_url: String,
    /// Path of the refresh endpoint, relative to `base_url`.
    pub refresh_path: String,
    /// Seconds before real expiry at which the access credential is
    /// treated as expired.
    pub refresh_skew_seconds: i64,
    /// Remaining lifetime at or below which health reports `expiring-soon`.
    pub warning_threshold_seconds: i64,
    /// Upper bound on one refresh exchange.
    pub refresh_timeout_seconds: u64,
    /// Upper bound on one ordinary API call.
    pub request_timeout_seconds: u64,
    /// JSON file holding the credentials. In-memory storage when unset.
    pub storage_path: Option<PathBuf>,
    /// Storage key of the access credential.
    pub access_key: String,
    /// Storage key of the refresh credential.
    pub refresh_key: String,
    /// Storage key of the cached user profile, cleared on logout.
    pub profile_key: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            refresh_path: "/token/refresh".to_string(),
            refresh_skew_seconds: 30,
            warning_threshold_seconds: 600,
            refresh_timeout_seconds: 10,
            request_timeout_seconds: 30,
            storage_path: None,
            access_key: "access_token".to_string(),
            refresh_key: "refresh_token".to_string(),
            profile_key: "user_profile".to_string(),
        }
    }
}

impl SessionSettings {
    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSetting`] naming the first bad field.
    pub fn validate(&self) -> DomainResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(DomainError::InvalidSetting("base_url is empty".into()));
        }
        if !self.refresh_path.starts_with('/') {
            return Err(DomainError::InvalidSetting(
                "refresh_path must start with '/'".into(),
            ));
        }
        if self.refresh_skew_seconds < 0 {
            return Err(DomainError::InvalidSetting(
                "refresh_skew_seconds must not be negative".into(),
            ));
        }
        if self.warning_threshold_seconds < 0 {
            return Err(DomainError::InvalidSetting(
                "warning_threshold_seconds must not be negative".into(),
            ));
        }
        if self.refresh_timeout_seconds == 0 {
            return Err(DomainError::InvalidSetting(
                "refresh_timeout_seconds must be positive".into(),
            ));
        }
        let keys = [&self.access_key, &self.refresh_key, &self.profile_key];
        if keys.iter().any(|k| k.is_empty()) {
            return Err(DomainError::InvalidSetting("storage keys must not be empty".into()));
        }
        if self.access_key == self.refresh_key {
            return Err(DomainError::InvalidSetting(
                "access_key and refresh_key must differ".into(),
            ));
        }
        Ok(())
    }

    /// Full URL of the refresh endpoint.
    #[must_use]
    pub fn refresh_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.refresh_path)
    }
}
