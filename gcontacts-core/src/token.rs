//! Access token lifecycle seams.
//!
//! This module provides:
//! - [`AuthManager`] - Hands out cached access tokens and forces renewal
//! - [`TokenExchanger`] - Converts a refresh token into a fresh access token
//! - [`AuthError`] - Everything that can go wrong while obtaining a token

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::store::{Secret, StoreError};

/// Error type for token operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The credential record could not be loaded.
    #[error("failed to load credentials: {0}")]
    CredentialLoad(#[from] StoreError),

    /// The credential record has no refresh token. Not recoverable by retrying.
    #[error("no refresh token provided")]
    MissingRefreshCredential,

    /// The token endpoint rejected the exchange.
    #[error("token exchange failed: {message}")]
    ExchangeFailed { message: String },

    /// The token endpoint answered with something that is not a token response.
    #[error("malformed token response: {message}")]
    InvalidResponse { message: String },

    /// Network error while talking to the token endpoint.
    #[error("network error during token exchange: {message}")]
    Network { message: String },
}

/// Trait for handing out bearer tokens.
///
/// Implementations never check token freshness; a stale token is only
/// discovered when a request made with it fails, at which point the caller
/// asks for [`force_renew`](AuthManager::force_renew).
///
/// # Example
///
/// ```rust,ignore
/// use gcontacts_core::{AuthManager, AuthError};
///
/// async fn bearer(manager: &impl AuthManager) -> Result<String, AuthError> {
///     let token = manager.access_token().await?;
///     Ok(format!("Bearer {}", token.expose()))
/// }
/// ```
#[async_trait]
pub trait AuthManager: Send + Sync {
    /// Return the cached access token, exchanging the refresh token if none is cached.
    async fn access_token(&self) -> Result<Secret, AuthError>;

    /// Discard any cached access token and exchange the refresh token for a new one.
    async fn force_renew(&self) -> Result<Secret, AuthError>;
}

/// Trait for the refresh-token exchange with the authorization server.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Exchange a refresh token for a new access token.
    async fn exchange(&self, refresh_token: &Secret) -> Result<Secret, AuthError>;
}

#[async_trait]
impl<M: AuthManager + ?Sized> AuthManager for Arc<M> {
    async fn access_token(&self) -> Result<Secret, AuthError> {
        (**self).access_token().await
    }

    async fn force_renew(&self) -> Result<Secret, AuthError> {
        (**self).force_renew().await
    }
}

#[async_trait]
impl<X: TokenExchanger + ?Sized> TokenExchanger for Arc<X> {
    async fn exchange(&self, refresh_token: &Secret) -> Result<Secret, AuthError> {
        (**self).exchange(refresh_token).await
    }
}
