//! In-memory access token cache.

use chrono::{DateTime, Utc};
use std::fmt;
use tokio::sync::RwLock;

/// Seconds of remaining lifetime below which a token no longer counts as
/// valid. Keeps callers from holding tokens that die mid-request.
pub const EXPIRY_SKEW_SECS: i64 = 300;

/// Identity attached to the cached token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    /// User ID from the identity provider
    pub id: String,
    /// User email, when the provider reported one
    pub email: Option<String>,
}

/// Cached access token with its expiry and owning user.
#[derive(Clone)]
pub struct TokenEntry {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthenticatedUser,
}

impl TokenEntry {
    /// Whether the token counts as valid at `now`.
    ///
    /// Validity requires the remaining lifetime to be at least the skew
    /// window; a token exactly at the boundary still counts.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.signed_duration_since(now).num_seconds() >= EXPIRY_SKEW_SECS
    }
}

impl fmt::Debug for TokenEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEntry")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Process-local cache for the current access token.
///
/// The entry is swapped or cleared as a whole, so readers never observe a
/// token paired with another token's expiry or user.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: RwLock<Option<TokenEntry>>,
}

impl TokenCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// The cached token regardless of validity.
    ///
    /// Used for best-effort sign-out, where an expired token is still worth
    /// sending to the server.
    pub async fn access_token(&self) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref().map(|entry| entry.access_token.clone())
    }

    /// The cached token, only while it is still valid.
    pub async fn valid_access_token(&self) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.is_valid_at(Utc::now()))
            .map(|entry| entry.access_token.clone())
    }

    /// Whether a valid token is currently held.
    pub async fn is_valid(&self) -> bool {
        let slot = self.slot.read().await;
        slot.as_ref().is_some_and(|entry| entry.is_valid_at(Utc::now()))
    }

    /// Replace the cached entry in one swap.
    pub async fn replace(
        &self,
        access_token: String,
        expires_at: DateTime<Utc>,
        user: AuthenticatedUser,
    ) {
        let mut slot = self.slot.write().await;
        *slot = Some(TokenEntry {
            access_token,
            expires_at,
            user,
        });
    }

    /// Drop the cached entry.
    pub async fn clear(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
    }

    /// The user attached to the cached token.
    pub async fn user(&self) -> Option<AuthenticatedUser> {
        let slot = self.slot.read().await;
        slot.as_ref().map(|entry| entry.user.clone())
    }

    /// Expiry of the cached token.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        let slot = self.slot.read().await;
        slot.as_ref().map(|entry| entry.expires_at)
    }
}
