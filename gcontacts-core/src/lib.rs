//! # gcontacts Core
//!
//! Client library for the GData contacts directory.
//!
//! This crate provides:
//! - Domain types for contact entries, feeds and queries
//! - A namespace-correct Atom/GData XML codec
//! - Credential storage (JSON file, in-memory and optionally the OS keyring)
//! - An auth manager that caches the access token and renews it on demand
//! - A directory client that retries once after a forced renewal
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gcontacts_core::{
//!     ClientConfig, ContactQuery, ContactsClient, DefaultAuthManager,
//!     FileCredentialStore, OAuthClientConfig, RefreshTokenExchanger,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! let store = FileCredentialStore::new("auth.json");
//! let exchanger = RefreshTokenExchanger::new(OAuthClientConfig::new("id", "secret"));
//! let auth = DefaultAuthManager::new(store, exchanger);
//! let client = ContactsClient::with_reqwest(auth, ClientConfig::default())?;
//!
//! let feed = client.fetch_feed(&ContactQuery::new(), &CancellationToken::new()).await?;
//! println!("{} contacts", feed.total_results);
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod oauth;
pub mod store;
pub mod token;
pub mod token_manager;
pub mod transport;

// Re-export commonly used types at crate root
pub use client::ContactsClient;

pub use codec::{decode_entry, decode_feed, encode_entry, CodecError, Namespace};

pub use config::{ClientConfig, RetryPolicy};

pub use error::{ContactsError, ErrorKind};

pub use model::{
    ContactImage,
    ContactQuery,
    EditableResource,
    Entry,
    Feed,
    GroupQuery,
};

pub use oauth::{OAuthClientConfig, RefreshTokenExchanger};

pub use store::{
    CredentialRecord,
    CredentialStore,
    FileCredentialStore,
    MemoryCredentialStore,
    Secret,
    StoreError,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringCredentialStore;

pub use token::{AuthError, AuthManager, TokenExchanger};

pub use token_manager::DefaultAuthManager;

pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
