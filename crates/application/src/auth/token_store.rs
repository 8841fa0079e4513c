//! Credential storage over the key/value port.
//!
//! The store is the single source of truth for "am I logged in". Every
//! read goes to the backing storage; nothing is cached here.

use std::sync::Arc;

use tracing::warn;
use warden_domain::{SessionSettings, TokenPair};

use crate::ports::{KeyValueStorage, StorageError};

/// Storage keys owned by the token store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenKeys {
    /// Key of the access credential.
    pub access: String,
    /// Key of the refresh credential.
    pub refresh: String,
    /// Key of the cached user profile.
    pub profile: String,
}

impl Default for TokenKeys {
    fn default() -> Self {
        Self::from(&SessionSettings::default())
    }
}

impl From<&SessionSettings> for TokenKeys {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            access: settings.access_key.clone(),
            refresh: settings.refresh_key.clone(),
            profile: settings.profile_key.clone(),
        }
    }
}

/// Synchronous access/refresh credential store.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    keys: TokenKeys,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").field("keys", &self.keys).finish_non_exhaustive()
    }
}

impl TokenStore {
    /// Creates a store with the default key names.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_keys(storage, TokenKeys::default())
    }

    /// Creates a store with custom key names.
    #[must_use]
    pub fn with_keys(storage: Arc<dyn KeyValueStorage>, keys: TokenKeys) -> Self {
        Self { storage, keys }
    }

    /// Reads both credentials.
    ///
    /// # Errors
    /// Returns an error if the storage cannot be read.
    pub fn get(&self) -> Result<TokenPair, StorageError> {
        Ok(TokenPair {
            access: self.storage.get(&self.keys.access)?,
            refresh: self.storage.get(&self.keys.refresh)?,
        })
    }

    /// Reads the access credential.
    ///
    /// # Errors
    /// Returns an error if the storage cannot be read.
    pub fn access(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(&self.keys.access)
    }

    /// Reads the refresh credential.
    ///
    /// # Errors
    /// Returns an error if the storage cannot be read.
    pub fn refresh(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(&self.keys.refresh)
    }

    /// Writes whichever credentials are given. An absent side is left
    /// untouched.
    ///
    /// # Errors
    /// Returns an error if the storage cannot be written.
    pub fn set(&self, access: Option<&str>, refresh: Option<&str>) -> Result<(), StorageError> {
        let mut entries = Vec::with_capacity(2);
        if let Some(access) = access {
            entries.push((self.keys.access.as_str(), access));
        }
        if let Some(refresh) = refresh {
            entries.push((self.keys.refresh.as_str(), refresh));
        }
        if entries.is_empty() {
            return Ok(());
        }
        self.storage.set_all(&entries)
    }

    /// Removes both credentials and the cached profile.
    ///
    /// Never reads first and never fails: if the batch removal errors,
    /// each key is removed on its own and remaining errors are logged.
    pub fn clear(&self) {
        let keys = [
            self.keys.access.as_str(),
            self.keys.refresh.as_str(),
            self.keys.profile.as_str(),
        ];
        if let Err(e) = self.storage.remove_all(&keys) {
            warn!(error = %e, "batch credential removal failed, removing keys one by one");
            for key in keys {
                if let Err(e) = self.storage.remove(key) {
                    warn!(key, error = %e, "failed to remove credential key");
                }
            }
        }
    }

    /// Returns true if either credential is stored.
    ///
    /// # Errors
    /// Returns an error if the storage cannot be read.
    pub fn has_credentials(&self) -> Result<bool, StorageError> {
        Ok(!self.get()?.is_empty())
    }
}
