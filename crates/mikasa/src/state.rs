//! Session state types.

use serde::{Deserialize, Serialize};

/// Where the client should route after session restore or login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No usable session; show the login screen.
    NeedsLogin,
    /// Live session, but the user has not completed their profile.
    AuthenticatedNeedsProfile,
    /// Live session with a completed profile.
    AuthenticatedWithProfile,
}

impl SessionState {
    /// Whether this state carries a live session.
    pub fn is_authenticated(&self) -> bool {
        matches!(
            self,
            SessionState::AuthenticatedNeedsProfile | SessionState::AuthenticatedWithProfile
        )
    }
}

/// Point-in-time view of the session for status surfaces.
///
/// `authenticated` is true only while a valid access token is held; the
/// identity fields may still be populated from the stored identity when it
/// is not.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    /// Access token expiry (RFC 3339), when a token is held.
    pub expires_at: Option<String>,
}
