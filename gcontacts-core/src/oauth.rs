//! OAuth 2.0 refresh-token exchange.
//!
//! Only the `grant_type=refresh_token` leg of OAuth is modeled. Obtaining the
//! initial refresh token happens outside this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::store::Secret;
use crate::token::{AuthError, TokenExchanger};

/// Google's OAuth 2.0 token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v4/token";

/// OAuth client registration used for the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthClientConfig {
    /// Client ID from the developer console.
    pub client_id: String,

    /// Client secret from the developer console.
    pub client_secret: Secret,

    /// Token endpoint URL.
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

impl OAuthClientConfig {
    /// Create a client configuration targeting the default token endpoint.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret),
            token_url: default_token_url(),
        }
    }

    /// Set the token endpoint URL.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }
}

/// Fields of the token endpoint's JSON answer that this crate reads.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Exchanges refresh tokens with a form POST to the token endpoint.
#[derive(Debug, Clone)]
pub struct RefreshTokenExchanger {
    config: OAuthClientConfig,
    http_client: reqwest::Client,
}

impl RefreshTokenExchanger {
    /// Create an exchanger with a default HTTP client.
    pub fn new(config: OAuthClientConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    /// Create an exchanger sharing an existing HTTP client.
    pub fn with_http_client(config: OAuthClientConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &OAuthClientConfig {
        &self.config
    }
}

#[async_trait]
impl TokenExchanger for RefreshTokenExchanger {
    async fn exchange(&self, refresh_token: &Secret) -> Result<Secret, AuthError> {
        tracing::debug!("Requesting access token from {}", self.config.token_url);

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&[
                ("refresh_token", refresh_token.expose()),
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Network {
                message: format!("token request failed: {}", e),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AuthError::Network {
            message: format!("failed to read token response: {}", e),
        })?;

        let parsed: Result<TokenEndpointResponse, _> = serde_json::from_str(&body);

        if !status.is_success() {
            let detail = match parsed {
                Ok(TokenEndpointResponse {
                    error: Some(error),
                    error_description,
                    ..
                }) => match error_description {
                    Some(description) => format!("{}: {}", error, description),
                    None => error,
                },
                _ => body,
            };
            return Err(AuthError::ExchangeFailed {
                message: format!("{}: {}", status, detail),
            });
        }

        let parsed = parsed.map_err(|e| AuthError::InvalidResponse {
            message: format!("failed to parse token response: {}", e),
        })?;

        match parsed.access_token {
            Some(token) if !token.is_empty() => Ok(Secret::new(token)),
            _ => Err(AuthError::ExchangeFailed {
                message: match parsed.error {
                    Some(error) => format!("OAuth error: {}", error),
                    None => "missing access_token in response".to_string(),
                },
            }),
        }
    }
}
