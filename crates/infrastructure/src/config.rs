//! Settings loading.
//!
//! Layers, later wins: built-in defaults, an optional JSON file, then
//! `WARDEN_*` environment variables.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use warden_domain::{DomainError, SessionSettings};

use crate::serialization::{SerializationError, from_json};

/// Environment variable names.
pub mod env {
    /// Backend base URL.
    pub const BASE_URL: &str = "WARDEN_BASE_URL";
    /// Refresh endpoint path.
    pub const REFRESH_PATH: &str = "WARDEN_REFRESH_PATH";
    /// Expiry skew in seconds.
    pub const REFRESH_SKEW: &str = "WARDEN_REFRESH_SKEW";
    /// Expiring-soon threshold in seconds.
    pub const WARNING_THRESHOLD: &str = "WARDEN_WARNING_THRESHOLD";
    /// Refresh exchange timeout in seconds.
    pub const REFRESH_TIMEOUT: &str = "WARDEN_REFRESH_TIMEOUT";
    /// API call timeout in seconds.
    pub const REQUEST_TIMEOUT: &str = "WARDEN_REQUEST_TIMEOUT";
    /// Credential file path.
    pub const STORAGE_PATH: &str = "WARDEN_STORAGE_PATH";
}

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`SessionSettings`].
    #[error("invalid settings file {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: SerializationError,
    },

    /// An environment variable holds an unusable value.
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },

    /// The merged settings failed validation.
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

/// Loads settings from defaults, `path` (if given) and the process environment.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an environment
/// variable is malformed, or the result fails validation.
pub fn load_settings(path: Option<&Path>) -> Result<SessionSettings, ConfigError> {
    load_settings_with(path, |name| std::env::var(name).ok())
}

/// Same as [`load_settings`] with an explicit variable lookup.
///
/// # Errors
///
/// See [`load_settings`].
pub fn load_settings_with(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SessionSettings, ConfigError> {
    let mut settings = match path {
        Some(path) => read_file(path)?,
        None => SessionSettings::default(),
    };
    apply_env(&mut settings, lookup)?;
    settings.validate()?;
    Ok(settings)
}

fn read_file(path: &Path) -> Result<SessionSettings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "settings file loaded");
    from_json(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env(
    settings: &mut SessionSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(value) = lookup(env::BASE_URL) {
        settings.base_url = value;
    }
    if let Some(value) = lookup(env::REFRESH_PATH) {
        settings.refresh_path = value;
    }
    if let Some(value) = lookup(env::REFRESH_SKEW) {
        settings.refresh_skew_seconds = parse(env::REFRESH_SKEW, value)?;
    }
    if let Some(value) = lookup(env::WARNING_THRESHOLD) {
        settings.warning_threshold_seconds = parse(env::WARNING_THRESHOLD, value)?;
    }
    if let Some(value) = lookup(env::REFRESH_TIMEOUT) {
        settings.refresh_timeout_seconds = parse(env::REFRESH_TIMEOUT, value)?;
    }
    if let Some(value) = lookup(env::REQUEST_TIMEOUT) {
        settings.request_timeout_seconds = parse(env::REQUEST_TIMEOUT, value)?;
    }
    if let Some(value) = lookup(env::STORAGE_PATH) {
        settings.storage_path = Some(PathBuf::from(value));
    }
    Ok(())
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}
