//! Refresh endpoint client.
//!
//! Posts `{"refresh": "<credential>"}` to the backend's refresh endpoint
//! and reads `{"access": "...", "refresh": "..."}` back. Exactly one
//! request per call, no retries.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use warden_application::{RefreshClient, RefreshFailure, RefreshGrant};
use warden_domain::SessionSettings;

/// Content-Type for JSON bodies.
const JSON_CONTENT_TYPE: &str = "application/json";

/// Refresh request body.
#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Refresh response body. A missing `refresh` means the backend did not rotate it.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// [`RefreshClient`] backed by an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpRefreshClient {
    http_client: reqwest::Client,
    refresh_url: String,
    timeout: Duration,
}

impl HttpRefreshClient {
    /// Creates a client for `settings.refresh_url()`.
    ///
    /// # Errors
    ///
    /// Returns a transport failure if the HTTP client cannot be built.
    pub fn new(settings: &SessionSettings) -> Result<Self, RefreshFailure> {
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| RefreshFailure::Transport {
                message: e.to_string(),
            })?;
        Ok(Self::with_client(http_client, settings))
    }

    /// Creates a client sharing an existing reqwest client.
    #[must_use]
    pub fn with_client(http_client: reqwest::Client, settings: &SessionSettings) -> Self {
        Self {
            http_client,
            refresh_url: settings.refresh_url(),
            timeout: Duration::from_secs(settings.refresh_timeout_seconds),
        }
    }

    /// The endpoint this client posts to.
    #[must_use]
    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }
}

impl RefreshClient for HttpRefreshClient {
    async fn refresh(&self, refresh: &str) -> Result<RefreshGrant, RefreshFailure> {
        debug!(url = %self.refresh_url, "exchanging refresh credential");

        let response = self
            .http_client
            .post(&self.refresh_url)
            .header("Content-Type", JSON_CONTENT_TYPE)
            .timeout(self.timeout)
            .json(&RefreshRequest { refresh })
            .send()
            .await
            .map_err(|e: reqwest::Error| {
                if e.is_timeout() {
                    RefreshFailure::TimedOut
                } else {
                    RefreshFailure::Transport {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_text, "refresh endpoint rejected credential");
            return Err(RefreshFailure::rejected_by_server(status.as_u16()));
        }

        let body: RefreshResponse =
            response
                .json()
                .await
                .map_err(|e: reqwest::Error| RefreshFailure::Rejected {
                    status: Some(status.as_u16()),
                    reason: format!("malformed refresh response: {e}"),
                })?;

        Ok(RefreshGrant {
            access: body.access,
            refresh: body.refresh,
        })
    }
}
