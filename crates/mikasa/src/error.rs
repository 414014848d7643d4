//! Session error types.

use thiserror::Error;

/// Session error type.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Sending the one-time login code failed
    #[error("Failed to send login code: {0}")]
    OtpSend(String),

    /// The provider rejected the one-time login code
    #[error("Login code rejected: {0}")]
    OtpRejected(String),

    /// The provider rejected the refresh token; it is dead for good
    #[error("Refresh token rejected: {0}")]
    RefreshRejected(String),

    /// Refresh retries exhausted
    #[error("Token refresh failed after {0} attempts")]
    RefreshExhausted(u32),

    /// No session exists; the caller must log in first
    #[error("Not logged in")]
    NotLoggedIn,

    /// The provider answered with a payload we cannot use
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// Profile lookup failed
    #[error("Profile lookup failed: {0}")]
    ProfileLookup(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] campus_storage::StorageError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Network unavailable (transient error, can retry)
    #[error("Network unavailable")]
    NetworkUnavailable,
}

impl SessionError {
    /// Returns true if this error is transient and the operation can be retried.
    ///
    /// Transient errors include:
    /// - Network unavailable
    /// - HTTP errors with 5xx status codes
    /// - Connection timeouts
    pub fn is_transient(&self) -> bool {
        match self {
            SessionError::NetworkUnavailable => true,
            SessionError::Timeout => true,
            SessionError::Http(e) => {
                // Check if it's a connection error or 5xx server error
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }
}

/// Result type alias using SessionError.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient_network_unavailable() {
        assert!(SessionError::NetworkUnavailable.is_transient());
    }

    #[test]
    fn test_is_transient_timeout() {
        assert!(SessionError::Timeout.is_transient());
    }

    #[test]
    fn test_is_not_transient_otp_rejected() {
        assert!(!SessionError::OtpRejected("HTTP 401: invalid code".to_string()).is_transient());
    }

    #[test]
    fn test_is_not_transient_refresh_rejected() {
        assert!(!SessionError::RefreshRejected("HTTP 400: revoked".to_string()).is_transient());
    }

    #[test]
    fn test_is_not_transient_refresh_exhausted() {
        assert!(!SessionError::RefreshExhausted(3).is_transient());
    }

    #[test]
    fn test_is_not_transient_not_logged_in() {
        assert!(!SessionError::NotLoggedIn.is_transient());
    }

    #[test]
    fn test_is_not_transient_malformed_response() {
        assert!(!SessionError::MalformedResponse("no expiry".to_string()).is_transient());
    }

    #[test]
    fn test_is_not_transient_storage() {
        let err = SessionError::Storage(campus_storage::StorageError::Backend(
            "disk full".to_string(),
        ));
        assert!(!err.is_transient());
    }
}
