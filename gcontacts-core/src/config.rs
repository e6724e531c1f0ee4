//! Client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{ContactsError, Result};

/// Default directory host.
pub const DEFAULT_HOST: &str = "www.google.com";

/// Path of the contacts feed, relative to the host.
pub const CONTACTS_PATH: &str = "/m8/feeds/contacts/default/full/";

/// Path of the groups feed, relative to the host.
pub const GROUPS_PATH: &str = "/m8/feeds/groups/default/full/";

/// Which failures earn a renewed credential and a second attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Any failure of the first attempt except cancellation.
    #[default]
    AnyFailure,
    /// Only a 401 rejection.
    UnauthorizedOnly,
}

impl RetryPolicy {
    pub fn should_retry(self, error: &ContactsError) -> bool {
        if matches!(error, ContactsError::Cancelled) {
            return false;
        }
        match self {
            RetryPolicy::AnyFailure => true,
            RetryPolicy::UnauthorizedOnly => error.is_unauthorized(),
        }
    }
}

/// Settings for [`ContactsClient`](crate::client::ContactsClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Use `https` (the default) or plain `http`.
    #[serde(default = "default_use_https")]
    pub use_https: bool,

    /// Host, optionally with a port.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub retry_policy: RetryPolicy,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_use_https() -> bool {
    true
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            use_https: default_use_https(),
            host: default_host(),
            retry_policy: RetryPolicy::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Point the client at another host, e.g. a local mock server.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_https(mut self, use_https: bool) -> Self {
        self.use_https = use_https;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `scheme://host`, without a trailing slash.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        format!("{}://{}", scheme, self.host)
    }

    /// URL of the contacts feed.
    pub fn contacts_url(&self) -> Result<Url> {
        self.join(CONTACTS_PATH)
    }

    /// URL of the groups feed.
    pub fn groups_url(&self) -> Result<Url> {
        self.join(GROUPS_PATH)
    }

    fn join(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{}", self.base_url(), path);
        Url::parse(&raw).map_err(|e| ContactsError::Config {
            message: format!("invalid directory URL {:?}: {}", raw, e),
        })
    }
}
