//! High-level API for managing session credentials.

use crate::{CredentialKeys, CredentialStore, StorageResult};

/// Identity restored from the credential store.
///
/// Presence of a stored identity means a user was signed in at some point; it
/// is not proof that the session is still valid.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredIdentity {
    /// User ID from the identity provider
    pub user_id: String,
    /// User email from the identity provider
    pub email: String,
}

/// High-level API for storing and retrieving session credentials
pub struct SessionVault {
    store: Box<dyn CredentialStore>,
}

impl SessionVault {
    /// Create a new vault with the given storage backend
    pub fn new(store: Box<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Store a complete session (refresh token + identity)
    pub fn store_session(
        &self,
        refresh_token: &str,
        user_id: &str,
        email: Option<&str>,
    ) -> StorageResult<()> {
        self.store.set(CredentialKeys::REFRESH_TOKEN, refresh_token)?;
        self.store.set(CredentialKeys::USER_ID, user_id)?;
        match email {
            Some(email) => self.store.set(CredentialKeys::USER_EMAIL, email)?,
            None => {
                // Drop any stale email from a previous account
                let _ = self.store.delete(CredentialKeys::USER_EMAIL);
            }
        }
        Ok(())
    }

    /// Retrieve the refresh token
    pub fn refresh_token(&self) -> StorageResult<Option<String>> {
        self.store.get(CredentialKeys::REFRESH_TOKEN)
    }

    /// Retrieve the stored identity. Requires both the user ID and email to
    /// be present; a partial record counts as no identity.
    pub fn stored_identity(&self) -> StorageResult<Option<StoredIdentity>> {
        let user_id = self.store.get(CredentialKeys::USER_ID)?;
        let email = self.store.get(CredentialKeys::USER_EMAIL)?;

        match (user_id, email) {
            (Some(user_id), Some(email)) => Ok(Some(StoredIdentity { user_id, email })),
            _ => Ok(None),
        }
    }

    /// Check if a persisted session exists (a refresh token is stored)
    pub fn has_session(&self) -> StorageResult<bool> {
        self.store.has(CredentialKeys::REFRESH_TOKEN)
    }

    /// Clear the persisted session. Idempotent; individual delete failures
    /// do not abort the remaining deletes.
    pub fn clear_session(&self) -> StorageResult<()> {
        let _ = self.store.delete(CredentialKeys::REFRESH_TOKEN);
        let _ = self.store.delete(CredentialKeys::USER_ID);
        let _ = self.store.delete(CredentialKeys::USER_EMAIL);
        Ok(())
    }
}
