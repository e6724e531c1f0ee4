//! Credential record storage.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`CredentialRecord`] - The persisted refresh/access token pair
//! - [`CredentialStore`] - Trait for credential storage backends
//! - [`FileCredentialStore`] - JSON file implementation
//! - [`MemoryCredentialStore`] - In-memory implementation for testing
//! - [`KeyringCredentialStore`] - OS keyring implementation (with `keyring-store` feature)
//!
//! # File Format
//!
//! ```json
//! { "refresh_token": "1//0g...", "access_token": "ya29..." }
//! ```
//!
//! A missing or `null` `access_token` loads as an empty token.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

mod file;
mod memory;
#[cfg(feature = "keyring-store")]
mod keyring;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringCredentialStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the buffer is zeroed when the secret is dropped.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret holds an empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the secret and return the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// The persisted credential pair.
///
/// The refresh token is fixed at construction; only the access token changes
/// over the record's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    refresh_token: Secret,

    #[serde(default, deserialize_with = "null_as_empty")]
    access_token: Secret,
}

impl CredentialRecord {
    /// Create a record holding only a refresh token.
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: Secret::new(refresh_token),
            access_token: Secret::default(),
        }
    }

    /// Attach a cached access token.
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Secret::new(access_token);
        self
    }

    pub fn refresh_token(&self) -> &Secret {
        &self.refresh_token
    }

    pub fn access_token(&self) -> &Secret {
        &self.access_token
    }

    /// Whether an access token is cached.
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Replace the cached access token.
    pub fn set_access_token(&mut self, access_token: Secret) {
        self.access_token = access_token;
    }

    /// Drop the cached access token so the next access re-exchanges.
    pub fn clear_access_token(&mut self) {
        self.access_token = Secret::default();
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Secret, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.map(Secret::new).unwrap_or_default())
}

/// Error type for credential store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No credential record exists in the backend.
    #[error("credential record not found: {location}")]
    NotFound { location: String },

    /// I/O error reading or writing the record.
    #[error("I/O error on {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored record is not valid JSON.
    #[error("corrupt credential record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// The keyring backend is not available.
    #[error("keyring not available: {message}")]
    KeyringUnavailable { message: String },
}

/// Abstraction over credential record persistence.
///
/// The auth manager reloads the record on every access, so implementations
/// must not cache stale copies.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the credential record.
    async fn load(&self) -> Result<CredentialRecord, StoreError>;

    /// Persist the credential record, replacing whatever was stored.
    async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    async fn load(&self) -> Result<CredentialRecord, StoreError> {
        (**self).load().await
    }

    async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        (**self).save(record).await
    }
}

#[async_trait]
impl<S: CredentialStore + ?Sized> CredentialStore for Box<S> {
    async fn load(&self) -> Result<CredentialRecord, StoreError> {
        (**self).load().await
    }

    async fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        (**self).save(record).await
    }
}
