//! Default implementation of the AuthManager trait.
//!
//! This module provides [`DefaultAuthManager`], which composes a
//! [`CredentialStore`] with a [`TokenExchanger`].
//!
//! # Behavior
//!
//! - The credential record is reloaded from the store on every call
//! - A cached access token is returned as-is, without any freshness check
//! - A missing access token triggers one refresh-token exchange
//! - Exchanged tokens are persisted best-effort; a failed save is logged
//!   and the fresh token is still returned
//! - The load-check-exchange-store sequence runs under a mutex, so
//!   concurrent callers never interleave exchanges
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use gcontacts_core::{
//!     AuthManager, DefaultAuthManager, FileCredentialStore,
//!     oauth::{OAuthClientConfig, RefreshTokenExchanger},
//! };
//!
//! let store = FileCredentialStore::new("auth.json");
//! let exchanger = RefreshTokenExchanger::new(OAuthClientConfig::new("client-id", "client-secret"));
//! let manager = DefaultAuthManager::new(store, exchanger);
//!
//! let token = manager.access_token().await?;
//! println!("Access token: {}", token.expose());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    store::{CredentialRecord, CredentialStore, Secret},
    token::{AuthError, AuthManager, TokenExchanger},
};

/// Default implementation of AuthManager.
///
/// # Type Parameters
///
/// * `S` - The credential store implementation to use
/// * `X` - The token exchanger implementation to use
pub struct DefaultAuthManager<S, X> {
    store: S,
    exchanger: X,
    exchange_lock: Mutex<()>,
}

impl<S: CredentialStore, X: TokenExchanger> DefaultAuthManager<S, X> {
    /// Create a new auth manager from a store and an exchanger.
    pub fn new(store: S, exchanger: X) -> Self {
        Self {
            store,
            exchanger,
            exchange_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn exchanger(&self) -> &X {
        &self.exchanger
    }

    /// Exchange the record's refresh token and persist the result.
    ///
    /// Must be called with `exchange_lock` held.
    async fn exchange_and_store(&self, mut record: CredentialRecord) -> Result<Secret, AuthError> {
        if record.refresh_token().is_empty() {
            return Err(AuthError::MissingRefreshCredential);
        }

        let access_token = self.exchanger.exchange(record.refresh_token()).await?;
        tracing::info!("Exchanged refresh token for a new access token");

        record.set_access_token(access_token.clone());
        if let Err(e) = self.store.save(&record).await {
            tracing::warn!("Access token obtained but could not be persisted: {}", e);
        }

        Ok(access_token)
    }
}

impl<S, X> std::fmt::Debug for DefaultAuthManager<S, X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultAuthManager").finish_non_exhaustive()
    }
}

#[async_trait]
impl<S, X> AuthManager for DefaultAuthManager<S, X>
where
    S: CredentialStore,
    X: TokenExchanger,
{
    async fn access_token(&self) -> Result<Secret, AuthError> {
        let _guard = self.exchange_lock.lock().await;

        let record = self.store.load().await?;
        if record.has_access_token() {
            tracing::debug!("Using cached access token");
            return Ok(record.access_token().clone());
        }

        tracing::debug!("No cached access token, exchanging refresh token");
        self.exchange_and_store(record).await
    }

    async fn force_renew(&self) -> Result<Secret, AuthError> {
        let _guard = self.exchange_lock.lock().await;

        let mut record = self.store.load().await?;
        record.clear_access_token();

        tracing::info!("Forcing access token renewal");
        self.exchange_and_store(record).await
    }
}
