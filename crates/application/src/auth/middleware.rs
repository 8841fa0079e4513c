//! Auth request middleware.
//!
//! Attaches the access credential to outgoing requests and turns a 401
//! into one coordinated refresh followed by exactly one resubmission.

use tracing::{debug, warn};
use warden_domain::{ApiRequest, ApiResponse};

use super::coordinator::RefreshCoordinator;
use super::token_store::TokenStore;
use crate::error::ApplicationResult;
use crate::ports::{HttpTransport, RefreshClient};

/// Wraps a transport with credential attachment and 401 recovery.
pub struct AuthMiddleware<T, R> {
    transport: T,
    coordinator: RefreshCoordinator<R>,
}

impl<T: Clone, R> Clone for AuthMiddleware<T, R> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<T: HttpTransport, R: RefreshClient> AuthMiddleware<T, R> {
    /// Creates a middleware over `transport`.
    #[must_use]
    pub const fn new(transport: T, coordinator: RefreshCoordinator<R>) -> Self {
        Self {
            transport,
            coordinator,
        }
    }

    fn store(&self) -> &TokenStore {
        self.coordinator.store()
    }

    /// Outgoing hook: attaches the stored access credential, if any.
    ///
    /// Reads the store synchronously and never triggers a refresh.
    /// Auth-exempt requests are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be placed in a header.
    pub fn on_request(&self, request: &mut ApiRequest) -> ApplicationResult<()> {
        if request.auth_exempt {
            return Ok(());
        }
        match self.store().access() {
            Ok(Some(access)) => request.set_bearer(&access)?,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "credential storage unreadable, sending without credential"),
        }
        Ok(())
    }

    /// Sends `request`, recovering once from a 401.
    ///
    /// On 401 the coordinator is asked for a valid credential; on success
    /// the request is resubmitted once with it and that response is
    /// returned whatever its status. If the refresh fails, the original
    /// 401 is returned unchanged: the coordinator has already cleared the
    /// session and broadcast the expiry.
    ///
    /// # Errors
    ///
    /// Returns an error only when the transport produced no response or
    /// the credential cannot be attached.
    pub async fn execute(&self, mut request: ApiRequest) -> ApplicationResult<ApiResponse> {
        self.on_request(&mut request)?;
        let response = self.transport.send(&request).await?;

        if !response.is_unauthorized() || request.auth_exempt || request.retried {
            return Ok(response);
        }

        debug!(method = %request.method, path = %request.path, "401 received, recovering session");
        let rejected = request
            .header(warden_domain::http::AUTHORIZATION)
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);

        match self.coordinator.recover(rejected.as_deref()).await {
            Ok(access) => {
                request.retried = true;
                request.set_bearer(&access)?;
                Ok(self.transport.send(&request).await?)
            }
            Err(failure) => {
                debug!(error = %failure, "session recovery failed, returning original 401");
                Ok(response)
            }
        }
    }
}
