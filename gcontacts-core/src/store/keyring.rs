//! OS keyring-backed credential storage implementation.

use async_trait::async_trait;
use keyring::Entry;

use super::{CredentialRecord, CredentialStore, StoreError};

/// OS keyring-backed credential store.
///
/// The whole record is kept as one JSON-encoded keyring password:
/// - macOS: Keychain
/// - Linux: Secret Service API (via libsecret)
/// - Windows: Credential Manager
///
/// # Example
///
/// ```rust,ignore
/// use gcontacts_core::store::{KeyringCredentialStore, CredentialStore, CredentialRecord};
///
/// let store = KeyringCredentialStore::try_new("gcontacts", "me@example.com").unwrap();
/// store.save(&CredentialRecord::new("1//refresh")).await.unwrap();
/// ```
pub struct KeyringCredentialStore {
    service_name: String,
    user: String,
}

impl KeyringCredentialStore {
    /// Try to create a new keyring store.
    ///
    /// Returns an error if the keyring backend is not available on this platform.
    pub fn try_new(service_name: &str, user: &str) -> Result<Self, StoreError> {
        match Entry::new(service_name, user) {
            Ok(_) => Ok(Self {
                service_name: service_name.to_string(),
                user: user.to_string(),
            }),
            Err(e) => Err(StoreError::KeyringUnavailable {
                message: format!("keyring backend not available: {}", e),
            }),
        }
    }

    fn entry(&self) -> Result<Entry, StoreError> {
        Entry::new(&self.service_name, &self.user).map_err(|e| StoreError::BackendError {
            message: format!("failed to create keyring entry: {}", e),
        })
    }

    fn location(&self) -> String {
        format!("keyring:{}/{}", self.service_name, self.user)
    }
}

impl std::fmt::Debug for KeyringCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringCredentialStore")
            .field("service_name", &self.service_name)
            .field("user", &self.user)
            .finish()
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn load(&self) -> Result<CredentialRecord, StoreError> {
        match self.entry()?.get_password() {
            Ok(password) => Ok(serde_json::from_str(&password)?),
            Err(keyring::Error::NoEntry) => Err(StoreError::NotFound {
                location: self.location(),
            }),
            Err(keyring::Error::PlatformFailure(e)) => Err(StoreError::BackendError {
                message: format!("platform keyring failure: {}", e),
            }),
            Err(e) => Err(StoreError::BackendError {
                message: format!("keyring error: {}", e),
            }),
        }
    }

    async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let payload = serde_json::to_string(record)?;
        self.entry()?
            .set_password(&payload)
            .map_err(|e| StoreError::BackendError {
                message: format!("failed to set keyring password: {}", e),
            })
    }
}
