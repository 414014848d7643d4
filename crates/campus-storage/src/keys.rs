//! Storage key constants.

/// Storage keys used by the session layer
pub struct CredentialKeys;

impl CredentialKeys {
    /// Supabase refresh token
    pub const REFRESH_TOKEN: &'static str = "refresh_token";

    /// Authenticated user ID
    pub const USER_ID: &'static str = "user_id";

    /// Authenticated user email
    pub const USER_EMAIL: &'static str = "user_email";
}
