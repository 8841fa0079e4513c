//! Request and response model seen by the auth middleware.
//!
//! These types are transport-agnostic; the infrastructure layer maps
//! them onto a concrete HTTP client.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Name of the header that carries the access credential.
pub const AUTHORIZATION: &str = "authorization";

/// HTTP status that triggers coordinated recovery.
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// HTTP methods supported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Returns the method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the configured base URL, or an absolute URL.
    pub path: String,
    /// Headers keyed by lowercase name.
    pub headers: BTreeMap<String, String>,
    /// Optional JSON body.
    pub body: Option<String>,
    /// Skip credential attachment and 401 recovery (login, refresh).
    #[serde(default)]
    pub auth_exempt: bool,
    /// Set once the request has been resubmitted after a refresh.
    #[serde(default)]
    pub retried: bool,
}

impl ApiRequest {
    /// Creates a request with no headers or body.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
            auth_exempt: false,
            retried: false,
        }
    }

    /// Shorthand for a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Shorthand for a POST request with a JSON body.
    #[must_use]
    pub fn post_json(path: impl Into<String>, body: impl Into<String>) -> Self {
        let mut request = Self::new(HttpMethod::Post, path);
        request
            .headers
            .insert("content-type".to_string(), "application/json".to_string());
        request.body = Some(body.into());
        request
    }

    /// Marks the request as exempt from credential handling.
    #[must_use]
    pub const fn exempt(mut self) -> Self {
        self.auth_exempt = true;
        self
    }

    /// Sets a header, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or either part contains a
    /// control character.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) -> DomainResult<()> {
        let value = value.into();
        if name.is_empty() || name.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(DomainError::InvalidHeader(format!("bad name {name:?}")));
        }
        if value.chars().any(char::is_control) {
            return Err(DomainError::InvalidHeader(format!(
                "bad value for {name}"
            )));
        }
        self.headers.insert(name.to_ascii_lowercase(), value);
        Ok(())
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Attaches `credential` as a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential contains control characters.
    pub fn set_bearer(&mut self, credential: &str) -> DomainResult<()> {
        self.set_header(AUTHORIZATION, format!("Bearer {credential}"))
    }
}

/// A response returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Headers keyed by lowercase name.
    pub headers: BTreeMap<String, String>,
    /// Raw body text.
    pub body: String,
}

impl ApiResponse {
    /// Creates a response with the given status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns true for 401, the only status that triggers a refresh.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == STATUS_UNAUTHORIZED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_headers_are_case_insensitive() {
        let mut request = ApiRequest::get("/posts");
        request.set_header("X-Trace", "abc").unwrap_or_default();
        assert_eq!(request.header("x-trace"), Some("abc"));
        assert_eq!(request.header("X-TRACE"), Some("abc"));
    }

    #[test]
    fn test_set_bearer() {
        let mut request = ApiRequest::get("/posts");
        assert!(request.set_bearer("tok").is_ok());
        assert_eq!(request.header("Authorization"), Some("Bearer tok"));
    }

    #[test]
    fn test_rejects_control_characters() {
        let mut request = ApiRequest::get("/posts");
        assert!(request.set_bearer("tok\nx-injected: 1").is_err());
        assert!(request.set_header("bad name", "v").is_err());
    }

    #[test]
    fn test_exempt_and_defaults() {
        let request = ApiRequest::post_json("/token/refresh", "{}").exempt();
        assert!(request.auth_exempt);
        assert!(!request.retried);
        assert_eq!(request.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_response_classification() {
        assert!(ApiResponse::new(204, "").is_success());
        assert!(ApiResponse::new(401, "").is_unauthorized());
        assert!(!ApiResponse::new(403, "").is_unauthorized());
    }
}
