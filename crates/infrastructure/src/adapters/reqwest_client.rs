//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port using the reqwest library.
//! Relative request paths are resolved against the configured base URL.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, Method};
use url::Url;
use warden_application::ports::{HttpTransport, TransportError};
use warden_domain::{ApiRequest, ApiResponse, HttpMethod, SessionSettings};

/// HTTP transport implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport for `settings.base_url`.
    ///
    /// Default configuration:
    /// - Request timeout: `settings.request_timeout_seconds`
    /// - Follow redirects: up to 10
    /// - User-Agent: "Warden/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be created.
    pub fn new(settings: &SessionSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("Warden/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Self::with_client(client, settings)
    }

    /// Creates a transport with a custom reqwest client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn with_client(client: Client, settings: &SessionSettings) -> Result<Self, TransportError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| TransportError::InvalidRequest(format!("{e}: {}", settings.base_url)))?;
        Ok(Self {
            client,
            base_url,
            timeout: Duration::from_secs(settings.request_timeout_seconds),
        })
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Resolves a request path against the base URL. Absolute URLs pass through.
    fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(|e| TransportError::InvalidRequest(format!("{e}: {path}")));
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = format!("{base}/{}", path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| TransportError::InvalidRequest(format!("{e}: {joined}")))
    }

    /// Maps reqwest errors to the port's `TransportError`.
    pub(crate) fn map_error(error: &reqwest::Error, timeout: Duration) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }
        if error.is_connect() {
            return TransportError::Connection(error.to_string());
        }
        if error.is_builder() {
            return TransportError::InvalidRequest(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(&request.path)?;

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(self.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout))?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Other(format!("Failed to read body: {e}")))?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
