//! Credential storage for the CampusConnect client.
//!
//! Durable key-value persistence for the session credentials (refresh token,
//! user ID, user email), with a file-backed default implementation and a
//! typed [`SessionVault`] wrapper on top.

mod file;
mod keys;
mod traits;
mod vault;

pub use file::FileCredentialStore;
pub use keys::CredentialKeys;
pub use traits::CredentialStore;
pub use vault::{SessionVault, StoredIdentity};

use std::path::PathBuf;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend storage error
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create the default file-backed store at the given path.
pub fn create_store(path: impl Into<PathBuf>) -> StorageResult<Box<dyn CredentialStore>> {
    let store = FileCredentialStore::open(path)?;
    Ok(Box::new(store))
}

/// Create a SessionVault over the default file-backed store.
pub fn create_vault(path: impl Into<PathBuf>) -> StorageResult<SessionVault> {
    let store = create_store(path)?;
    Ok(SessionVault::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory store for testing
    pub struct MemoryStore {
        data: std::sync::Mutex<std::collections::HashMap<String, String>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self {
                data: std::sync::Mutex::new(std::collections::HashMap::new()),
            }
        }
    }

    impl CredentialStore for MemoryStore {
        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            let mut data = self.data.lock().unwrap();
            data.insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            let data = self.data.lock().unwrap();
            Ok(data.get(key).cloned())
        }

        fn delete(&self, key: &str) -> StorageResult<bool> {
            let mut data = self.data.lock().unwrap();
            Ok(data.remove(key).is_some())
        }
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();

        // Test set and get
        store.set("test_key", "test_value").unwrap();
        assert_eq!(
            store.get("test_key").unwrap(),
            Some("test_value".to_string())
        );

        // Test has
        assert!(store.has("test_key").unwrap());
        assert!(!store.has("nonexistent").unwrap());

        // Test delete
        assert!(store.delete("test_key").unwrap());
        assert!(!store.delete("test_key").unwrap());
        assert_eq!(store.get("test_key").unwrap(), None);
    }

    #[test]
    fn test_vault_session_roundtrip() {
        let vault = SessionVault::new(Box::new(MemoryStore::new()));

        // Initially no session
        assert!(!vault.has_session().unwrap());
        assert_eq!(vault.refresh_token().unwrap(), None);
        assert_eq!(vault.stored_identity().unwrap(), None);

        vault
            .store_session("rt-1", "user-123", Some("anna@edu.campus.at"))
            .unwrap();

        assert!(vault.has_session().unwrap());
        assert_eq!(vault.refresh_token().unwrap(), Some("rt-1".to_string()));

        let identity = vault.stored_identity().unwrap().unwrap();
        assert_eq!(identity.user_id, "user-123");
        assert_eq!(identity.email, "anna@edu.campus.at");

        // Clear session
        vault.clear_session().unwrap();
        assert!(!vault.has_session().unwrap());
        assert_eq!(vault.refresh_token().unwrap(), None);
        assert_eq!(vault.stored_identity().unwrap(), None);
    }

    #[test]
    fn test_vault_identity_requires_both_fields() {
        let store = MemoryStore::new();
        store.set(CredentialKeys::USER_ID, "user-123").unwrap();

        let vault = SessionVault::new(Box::new(store));
        assert_eq!(vault.stored_identity().unwrap(), None);
    }

    #[test]
    fn test_vault_store_without_email_drops_stale_email() {
        let vault = SessionVault::new(Box::new(MemoryStore::new()));

        vault
            .store_session("rt-1", "user-123", Some("anna@edu.campus.at"))
            .unwrap();
        vault.store_session("rt-2", "user-456", None).unwrap();

        // The old account's email must not survive the new session
        assert_eq!(vault.refresh_token().unwrap(), Some("rt-2".to_string()));
        assert_eq!(vault.stored_identity().unwrap(), None);
    }

    #[test]
    fn test_vault_clear_is_idempotent() {
        let vault = SessionVault::new(Box::new(MemoryStore::new()));

        vault.clear_session().unwrap();
        vault
            .store_session("rt-1", "user-123", Some("anna@edu.campus.at"))
            .unwrap();
        vault.clear_session().unwrap();
        vault.clear_session().unwrap();

        assert!(!vault.has_session().unwrap());
    }

    #[test]
    fn test_credential_keys_constants() {
        // Verify all storage keys are defined and non-empty
        assert!(!CredentialKeys::REFRESH_TOKEN.is_empty());
        assert!(!CredentialKeys::USER_ID.is_empty());
        assert!(!CredentialKeys::USER_EMAIL.is_empty());

        // Verify keys are unique
        let keys = vec![
            CredentialKeys::REFRESH_TOKEN,
            CredentialKeys::USER_ID,
            CredentialKeys::USER_EMAIL,
        ];
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len(), "Storage keys must be unique");
    }
}
