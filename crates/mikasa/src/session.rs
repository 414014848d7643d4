//! Session coordination: restore, login, refresh, and sign-out.
//!
//! The coordinator owns the token cache and the persisted credentials and is
//! the only writer to either. All token redemption funnels through a single
//! lock, so concurrent callers cannot race a rotating refresh token.

use crate::cache::{AuthenticatedUser, TokenCache};
use crate::error::{SessionError, SessionResult};
use crate::profile::ProfileProbe;
use crate::provider::{AuthGrant, IdentityProvider};
use crate::state::{SessionSnapshot, SessionState};
use crate::tasks::{spawn_periodic, PeriodicTask};
use campus_storage::SessionVault;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Configuration for retry behavior during token refresh.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
        }
    }
}

impl RefreshConfig {
    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay_ms.saturating_mul(2u64.pow(attempt));
        let capped_ms = delay_ms.min(self.max_delay_ms);
        Duration::from_millis(capped_ms)
    }
}

/// Coordinates the persisted credentials, the token cache, and the identity
/// provider.
///
/// Constructed once at startup and shared via `Arc`; every collaborator is
/// injected explicitly.
pub struct SessionCoordinator {
    vault: SessionVault,
    provider: Arc<dyn IdentityProvider>,
    profile: Arc<dyn ProfileProbe>,
    cache: TokenCache,
    /// Serializes token redemption and local session writes. Held across the
    /// provider round trip so at most one redemption of the stored refresh
    /// token is in flight and sign-out cannot interleave with it.
    refresh_lock: Mutex<()>,
    /// Configuration for refresh retry behavior.
    refresh_config: RefreshConfig,
}

impl SessionCoordinator {
    /// Create a new session coordinator.
    pub fn new(
        vault: SessionVault,
        provider: Arc<dyn IdentityProvider>,
        profile: Arc<dyn ProfileProbe>,
    ) -> Self {
        Self {
            vault,
            provider,
            profile,
            cache: TokenCache::new(),
            refresh_lock: Mutex::new(()),
            refresh_config: RefreshConfig::default(),
        }
    }

    /// Create a new session coordinator with custom refresh configuration.
    pub fn with_refresh_config(
        vault: SessionVault,
        provider: Arc<dyn IdentityProvider>,
        profile: Arc<dyn ProfileProbe>,
        refresh_config: RefreshConfig,
    ) -> Self {
        Self {
            vault,
            provider,
            profile,
            cache: TokenCache::new(),
            refresh_lock: Mutex::new(()),
            refresh_config,
        }
    }

    /// Get an access token that is valid right now, refreshing if necessary.
    ///
    /// The fast path reads the cache without the refresh lock. On a miss the
    /// lock is taken and the cache checked again: a caller that was parked
    /// behind an in-flight refresh must use that refresh's result, because
    /// the refresh token it would otherwise redeem has already been rotated.
    pub async fn get_valid_access_token(&self) -> SessionResult<String> {
        if let Some(token) = self.cache.valid_access_token().await {
            return Ok(token);
        }

        let guard = self.refresh_lock.lock().await;

        // Re-check: another caller may have refreshed while we waited
        if let Some(token) = self.cache.valid_access_token().await {
            debug!("Token refreshed by concurrent caller");
            return Ok(token);
        }

        let refresh_token = self
            .vault
            .refresh_token()?
            .ok_or(SessionError::NotLoggedIn)?;

        info!("Access token missing or expiring, redeeming refresh token");
        let grant = self.redeem_with_backoff(&refresh_token).await?;
        let access_token = grant.access_token.clone();
        self.install_session(grant).await?;

        drop(guard);
        Ok(access_token)
    }

    /// Redeem the refresh token with exponential backoff on transient errors.
    ///
    /// A provider rejection is terminal for the stored token: cache and
    /// persisted credentials are purged before the error is returned.
    /// Transient failures and exhausted retries leave the stored session
    /// in place so a later call can try again.
    async fn redeem_with_backoff(&self, refresh_token: &str) -> SessionResult<AuthGrant> {
        let mut last_error = None;

        for attempt in 0..self.refresh_config.max_retries {
            match self.provider.redeem_refresh_token(refresh_token).await {
                Ok(grant) => return Ok(grant),
                Err(e @ SessionError::RefreshRejected(_)) => {
                    warn!(error = %e, "Refresh token rejected, tearing down session");
                    self.teardown_local().await;
                    return Err(e);
                }
                Err(e) if e.is_transient() => {
                    last_error = Some(e);

                    if attempt + 1 < self.refresh_config.max_retries {
                        let delay = self.refresh_config.delay_for_attempt(attempt);
                        debug!(
                            attempt = attempt + 1,
                            max_retries = self.refresh_config.max_retries,
                            delay_ms = delay.as_millis(),
                            "Redemption failed with transient error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Redemption failed with non-transient error");
                    return Err(e);
                }
            }
        }

        warn!(
            "Redemption failed after {} attempts",
            self.refresh_config.max_retries
        );

        Err(last_error.unwrap_or(SessionError::RefreshExhausted(self.refresh_config.max_retries)))
    }

    /// Persist the grant, then publish it to the cache.
    ///
    /// Persistence goes first: if the write fails the cache is never
    /// populated, and local state is torn down so memory and disk cannot
    /// disagree about which refresh token is current.
    async fn install_session(&self, grant: AuthGrant) -> SessionResult<()> {
        if let Err(e) = self.vault.store_session(
            &grant.refresh_token,
            &grant.user.id,
            grant.user.email.as_deref(),
        ) {
            warn!(error = %e, "Failed to persist rotated credentials, tearing down session");
            self.teardown_local().await;
            return Err(SessionError::Storage(e));
        }

        self.cache
            .replace(grant.access_token, grant.expires_at, grant.user)
            .await;

        Ok(())
    }

    /// Drop the in-memory token and the persisted credentials.
    async fn teardown_local(&self) {
        self.cache.clear().await;
        if let Err(e) = self.vault.clear_session() {
            warn!(error = %e, "Failed to clear persisted credentials");
        }
    }

    /// Restore the session on startup and report where to route the user.
    ///
    /// Never fails: every outcome maps to a [`SessionState`]. A transient
    /// redemption failure keeps the stored credentials for a later retry but
    /// still reports [`SessionState::NeedsLogin`] for this start.
    pub async fn initialize_session(&self) -> SessionState {
        match self.get_valid_access_token().await {
            Ok(_) => {
                info!("Persisted session restored");
                self.resolve_profile_state().await
            }
            Err(SessionError::NotLoggedIn) => {
                info!("No persisted session found on startup");
                SessionState::NeedsLogin
            }
            Err(e) => {
                warn!(error = %e, "Session restore failed");
                SessionState::NeedsLogin
            }
        }
    }

    /// Map the live session to a routing state via the profile probe.
    async fn resolve_profile_state(&self) -> SessionState {
        let (user, token) = match (self.cache.user().await, self.cache.access_token().await) {
            (Some(user), Some(token)) => (user, token),
            _ => return SessionState::NeedsLogin,
        };

        match self.profile.has_profile(&user.id, &token).await {
            Ok(true) => SessionState::AuthenticatedWithProfile,
            Ok(false) => SessionState::AuthenticatedNeedsProfile,
            Err(e) => {
                warn!(error = %e, "Profile lookup failed, routing to profile setup");
                SessionState::AuthenticatedNeedsProfile
            }
        }
    }

    /// Request a one-time login code for the given email.
    pub async fn send_login_code(&self, email: &str) -> SessionResult<()> {
        self.provider.send_otp(email).await
    }

    /// Complete an OTP login and report where to route the user.
    pub async fn verify_login_code(&self, email: &str, code: &str) -> SessionResult<SessionState> {
        let grant = self.provider.verify_otp(email, code).await?;

        info!(user_id = %grant.user.id, "Login code accepted");

        // Same single-writer discipline as refresh
        let guard = self.refresh_lock.lock().await;
        self.install_session(grant).await?;
        drop(guard);

        Ok(self.resolve_profile_state().await)
    }

    /// Sign out: best-effort server invalidation, then unconditional local
    /// teardown.
    ///
    /// Local state is always cleared, even when the server call fails or no
    /// token is cached. Holds the refresh lock, so a redemption in flight
    /// completes first and its rotated credentials are cleared with the rest.
    pub async fn sign_out(&self) {
        // Serialize with token redemption: a rotation completing after the
        // teardown below would re-persist live credentials.
        let _guard = self.refresh_lock.lock().await;

        // An expired token is still sent; the server may accept it
        if let Some(access_token) = self.cache.access_token().await {
            if let Err(e) = self.provider.sign_out(&access_token).await {
                warn!(error = %e, "Server sign-out failed, clearing local session anyway");
            }
        }

        self.teardown_local().await;
        info!("Signed out");
    }

    /// The signed-in user, from the live session when available, otherwise
    /// reconstructed from the persisted identity.
    ///
    /// A reconstructed identity is not proof the session is still valid.
    pub async fn current_user(&self) -> Option<AuthenticatedUser> {
        if let Some(user) = self.cache.user().await {
            return Some(user);
        }

        match self.vault.stored_identity() {
            Ok(Some(identity)) => Some(AuthenticatedUser {
                id: identity.user_id,
                email: Some(identity.email),
            }),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Could not read stored identity");
                None
            }
        }
    }

    /// Point-in-time view of the session for status surfaces.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let authenticated = self.cache.is_valid().await;
        let user = self.current_user().await;
        let expires_at = self.cache.expires_at().await.map(|dt| dt.to_rfc3339());

        SessionSnapshot {
            authenticated,
            user_id: user.as_ref().map(|u| u.id.clone()),
            email: user.and_then(|u| u.email),
            expires_at,
        }
    }

    /// Ensure the cached token is valid, redeeming the refresh token if not.
    pub async fn refresh_if_needed(&self) -> SessionResult<()> {
        self.get_valid_access_token().await.map(|_| ())
    }

    /// Keep the cached token fresh in the background.
    ///
    /// Not being logged in is a normal idle state for the poller; any other
    /// failure is logged and retried on the next tick.
    pub fn spawn_keepalive(self: &Arc<Self>, period: Duration) -> PeriodicTask {
        let coordinator = Arc::clone(self);
        spawn_periodic("session-keepalive", period, move || {
            let coordinator = Arc::clone(&coordinator);
            async move {
                match coordinator.refresh_if_needed().await {
                    Ok(()) => {}
                    Err(SessionError::NotLoggedIn) => {}
                    Err(e) => {
                        warn!(error = %e, "Background session refresh failed");
                    }
                }
            }
        })
    }
}
