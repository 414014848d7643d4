//! HTTP client for the identity provider's auth endpoints.

use crate::cache::AuthenticatedUser;
use crate::error::{SessionError, SessionResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};
use url::Url;

/// Request timeout for every provider call. Bounded so a hung provider
/// cannot hold the refresh lock indefinitely.
pub(crate) const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Tokens and identity returned by a successful verify or redeem call.
#[derive(Clone)]
pub struct AuthGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthenticatedUser,
}

impl fmt::Debug for AuthGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGrant")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Operations the session layer needs from the identity provider.
///
/// Implementations talk to the provider only; they never touch the
/// credential store or the token cache.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Request a one-time login code for the given email.
    async fn send_otp(&self, email: &str) -> SessionResult<()>;

    /// Exchange an email and code pair for a session grant.
    async fn verify_otp(&self, email: &str, code: &str) -> SessionResult<AuthGrant>;

    /// Exchange a refresh token for a new session grant.
    ///
    /// A provider rejection (any non-2xx) means the token is dead for good.
    /// Transport failures surface as transient HTTP errors instead.
    async fn redeem_refresh_token(&self, refresh_token: &str) -> SessionResult<AuthGrant>;

    /// Ask the provider to invalidate the session behind `access_token`.
    ///
    /// Any HTTP status counts as done; only transport failures error.
    async fn sign_out(&self, access_token: &str) -> SessionResult<()>;
}

/// OTP send request.
#[derive(Debug, Serialize)]
struct OtpRequest {
    email: String,
}

/// OTP verification request.
#[derive(Debug, Serialize)]
struct VerifyRequest {
    email: String,
    token: String,
    #[serde(rename = "type")]
    verify_type: String,
}

/// Token refresh request.
#[derive(Debug, Serialize)]
struct RefreshRequest {
    refresh_token: String,
}

/// Token grant response. Verify and refresh share this shape.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: UserPayload,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    /// Resolve the grant expiry, preferring the absolute `expires_at` unix
    /// timestamp over the relative `expires_in` window.
    fn into_grant(self) -> SessionResult<AuthGrant> {
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(unix), _) => DateTime::from_timestamp(unix, 0).ok_or_else(|| {
                SessionError::MalformedResponse(format!("invalid expires_at: {}", unix))
            })?,
            (None, Some(secs)) => Utc::now() + Duration::seconds(secs),
            (None, None) => {
                return Err(SessionError::MalformedResponse(
                    "response carries neither expires_at nor expires_in".to_string(),
                ))
            }
        };

        Ok(AuthGrant {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: AuthenticatedUser {
                id: self.user.id,
                email: self.user.email,
            },
        })
    }
}

/// HTTP implementation of [`IdentityProvider`] backed by Supabase Auth.
#[derive(Clone)]
pub struct ProviderClient {
    http_client: Client,
    auth_url: String,
    publishable_key: String,
}

impl ProviderClient {
    /// Create a client for the given project base URL and publishable key.
    pub fn new(base_url: &str, publishable_key: &str) -> SessionResult<Self> {
        // Validate early so a bad URL fails at construction, not first use
        Url::parse(base_url)?;

        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            auth_url: format!("{}/auth/v1", base_url.trim_end_matches('/')),
            publishable_key: publishable_key.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for ProviderClient {
    async fn send_otp(&self, email: &str) -> SessionResult<()> {
        let otp_url = format!("{}/otp", self.auth_url);

        debug!(url = %otp_url, email = %email, "Requesting login code");

        let response = self
            .http_client
            .post(&otp_url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .json(&OtpRequest {
                email: email.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Login code request failed");
            return Err(SessionError::OtpSend(format!("HTTP {}: {}", status, body)));
        }

        info!(email = %email, "Login code sent");
        Ok(())
    }

    async fn verify_otp(&self, email: &str, code: &str) -> SessionResult<AuthGrant> {
        let verify_url = format!("{}/verify", self.auth_url);

        debug!(url = %verify_url, email = %email, "Verifying login code");

        let response = self
            .http_client
            .post(&verify_url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .json(&VerifyRequest {
                email: email.to_string(),
                token: code.to_string(),
                verify_type: "email".to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Login code verification failed");
            return Err(SessionError::OtpRejected(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let data: TokenResponse = response.json().await?;
        let grant = data.into_grant()?;

        info!(user_id = %grant.user.id, "Login code verified");
        Ok(grant)
    }

    async fn redeem_refresh_token(&self, refresh_token: &str) -> SessionResult<AuthGrant> {
        let refresh_url = format!("{}/token?grant_type=refresh_token", self.auth_url);

        debug!(url = %refresh_url, "Redeeming refresh token");

        let response = self
            .http_client
            .post(&refresh_url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .json(&RefreshRequest {
                refresh_token: refresh_token.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Refresh token rejected");
            return Err(SessionError::RefreshRejected(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let data: TokenResponse = response.json().await?;
        let grant = data.into_grant()?;

        info!(user_id = %grant.user.id, "Refresh token redeemed");
        Ok(grant)
    }

    async fn sign_out(&self, access_token: &str) -> SessionResult<()> {
        let logout_url = format!("{}/logout", self.auth_url);

        debug!(url = %logout_url, "Requesting server-side sign-out");

        let response = self
            .http_client
            .post(&logout_url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        // Any response means the server saw the request; an already-dead
        // session commonly answers 401 here.
        debug!(status = %response.status(), "Sign-out request completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_response(expires_at: Option<i64>, expires_in: Option<i64>) -> TokenResponse {
        TokenResponse {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            expires_at,
            expires_in,
            user: UserPayload {
                id: "user-123".to_string(),
                email: Some("anna@edu.campus.at".to_string()),
            },
        }
    }

    #[test]
    fn test_into_grant_prefers_expires_at() {
        let unix = 1_750_000_000;
        let grant = token_response(Some(unix), Some(3600)).into_grant().unwrap();

        assert_eq!(grant.expires_at, DateTime::from_timestamp(unix, 0).unwrap());
        assert_eq!(grant.user.id, "user-123");
    }

    #[test]
    fn test_into_grant_derives_from_expires_in() {
        let before = Utc::now() + Duration::seconds(3590);
        let grant = token_response(None, Some(3600)).into_grant().unwrap();
        let after = Utc::now() + Duration::seconds(3610);

        assert!(grant.expires_at > before);
        assert!(grant.expires_at < after);
    }

    #[test]
    fn test_into_grant_requires_an_expiry() {
        let result = token_response(None, None).into_grant();
        assert!(matches!(result, Err(SessionError::MalformedResponse(_))));
    }

    #[test]
    fn test_verify_request_uses_email_type() {
        let request = VerifyRequest {
            email: "anna@edu.campus.at".to_string(),
            token: "123456".to_string(),
            verify_type: "email".to_string(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "email");
        assert_eq!(value["token"], "123456");
        assert!(value.get("verify_type").is_none());
    }

    #[test]
    fn test_token_response_parses_without_email() {
        let json = r#"{
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 3600,
            "user": { "id": "user-123" }
        }"#;

        let response: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.user.email, None);

        let grant = response.into_grant().unwrap();
        assert_eq!(grant.user.email, None);
    }

    #[test]
    fn test_client_builds_auth_url() {
        let client = ProviderClient::new("https://test.supabase.co", "test-key").unwrap();
        assert_eq!(client.auth_url, "https://test.supabase.co/auth/v1");

        // Trailing slashes do not produce double slashes
        let client = ProviderClient::new("https://test.supabase.co/", "test-key").unwrap();
        assert_eq!(client.auth_url, "https://test.supabase.co/auth/v1");
    }

    #[test]
    fn test_client_rejects_invalid_base_url() {
        let result = ProviderClient::new("not a url", "test-key");
        assert!(matches!(result, Err(SessionError::InvalidUrl(_))));
    }

    #[test]
    fn test_grant_debug_redacts_tokens() {
        let grant = token_response(None, Some(3600)).into_grant().unwrap();

        let rendered = format!("{:?}", grant);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("access-1"));
        assert!(!rendered.contains("refresh-1"));
    }
}
