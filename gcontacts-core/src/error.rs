//! Top-level error types for the directory client.

use reqwest::StatusCode;
use thiserror::Error;

use crate::codec::CodecError;
use crate::token::AuthError;

/// Result alias used by the client and transport layers.
pub type Result<T, E = ContactsError> = std::result::Result<T, E>;

/// Coarse classification of a [`ContactsError`], for callers that only need
/// to branch on the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CredentialLoad,
    MissingRefreshCredential,
    ExchangeFailure,
    RequestBuildFailure,
    RemoteRejection,
    DecodeFailure,
    Transport,
    Cancelled,
    Config,
}

/// Top-level error type encompassing all client errors.
#[derive(Debug, Error)]
pub enum ContactsError {
    /// Obtaining or renewing the access credential failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// The request could not be built (bad id, bad URL, unencodable body).
    #[error("failed to build request: {message}")]
    RequestBuild { message: String },

    /// The server answered with a status of 300 or above.
    #[error("{url} returned {status}: {body}")]
    RemoteRejection {
        url: String,
        status: StatusCode,
        body: String,
    },

    /// The request could not be delivered or its response could not be read.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ContactsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContactsError::Auth(err) => match err {
                AuthError::CredentialLoad(_) => ErrorKind::CredentialLoad,
                AuthError::MissingRefreshCredential => ErrorKind::MissingRefreshCredential,
                AuthError::ExchangeFailed { .. } => ErrorKind::ExchangeFailure,
                AuthError::InvalidResponse { .. } => ErrorKind::DecodeFailure,
                AuthError::Network { .. } => ErrorKind::ExchangeFailure,
            },
            ContactsError::RequestBuild { .. } => ErrorKind::RequestBuildFailure,
            ContactsError::RemoteRejection { .. } => ErrorKind::RemoteRejection,
            ContactsError::Transport { .. } => ErrorKind::Transport,
            ContactsError::Decode(_) => ErrorKind::DecodeFailure,
            ContactsError::Cancelled => ErrorKind::Cancelled,
            ContactsError::Config { .. } => ErrorKind::Config,
        }
    }

    /// Whether the server rejected the request with 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ContactsError::RemoteRejection { status, .. } if *status == StatusCode::UNAUTHORIZED
        )
    }

    /// HTTP status of a remote rejection.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ContactsError::RemoteRejection { status, .. } => Some(*status),
            _ => None,
        }
    }
}
