//! Profile existence lookup against the project's REST API.

use crate::error::{SessionError, SessionResult};
use crate::provider::REQUEST_TIMEOUT;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

/// Collaborator that answers whether a user has completed their profile.
///
/// Injected into the session coordinator so restore and login can route to
/// profile setup without the session layer knowing the profile schema.
#[async_trait]
pub trait ProfileProbe: Send + Sync {
    /// Whether a profile row exists for the given user.
    async fn has_profile(&self, user_id: &str, access_token: &str) -> SessionResult<bool>;
}

/// Profile lookup against the project's PostgREST endpoint.
pub struct RestProfileProbe {
    http_client: Client,
    rest_url: String,
    publishable_key: String,
}

impl RestProfileProbe {
    /// Create a probe for the given project base URL and publishable key.
    pub fn new(base_url: &str, publishable_key: &str) -> SessionResult<Self> {
        Url::parse(base_url)?;

        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            publishable_key: publishable_key.to_string(),
        })
    }
}

#[async_trait]
impl ProfileProbe for RestProfileProbe {
    async fn has_profile(&self, user_id: &str, access_token: &str) -> SessionResult<bool> {
        let query_url = format!(
            "{}/profiles?user_id=eq.{}&select=user_id&limit=1",
            self.rest_url, user_id
        );

        debug!(user_id = %user_id, "Checking for existing profile");

        let response = self
            .http_client
            .get(&query_url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Profile lookup failed");
            return Err(SessionError::ProfileLookup(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let rows: Vec<serde_json::Value> = response.json().await?;
        Ok(!rows.is_empty())
    }
}
