//! Builders for authenticated calls against the backend REST surface.

use crate::error::SessionResult;
use crate::provider::REQUEST_TIMEOUT;
use crate::session::SessionCoordinator;
use reqwest::{Client, Method, RequestBuilder};
use std::sync::Arc;

/// Builds HTTP requests that carry a live access token.
///
/// Every builder goes through [`SessionCoordinator::get_valid_access_token`],
/// so a request is never constructed with an empty or expired bearer: callers
/// get [`crate::SessionError::NotLoggedIn`] instead.
#[derive(Clone)]
pub struct RequestFactory {
    coordinator: Arc<SessionCoordinator>,
    http_client: Client,
    publishable_key: String,
}

impl RequestFactory {
    /// Create a request factory bound to the given coordinator.
    pub fn new(coordinator: Arc<SessionCoordinator>, publishable_key: &str) -> SessionResult<Self> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            coordinator,
            http_client,
            publishable_key: publishable_key.to_string(),
        })
    }

    /// Start a request with the project key and a freshly validated bearer
    /// token attached.
    pub async fn authenticated_request(
        &self,
        method: Method,
        url: &str,
    ) -> SessionResult<RequestBuilder> {
        let access_token = self.coordinator.get_valid_access_token().await?;

        Ok(self
            .http_client
            .request(method, url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json"))
    }
}
