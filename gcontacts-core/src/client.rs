//! Directory client.
//!
//! Every wire operation follows the same sequence: take the current access
//! token from the [`AuthManager`], attempt the request, and on failure force
//! a renewal and attempt it exactly once more. Which failures qualify is set
//! by [`RetryPolicy`](crate::config::RetryPolicy). Cancellation is never
//! retried.
//!
//! Responses are decoded only after the retry step, and a save encodes its
//! body once before the first attempt.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, IF_MATCH};
use reqwest::Method;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::codec::{decode_entry, decode_feed};
use crate::config::ClientConfig;
use crate::error::{ContactsError, Result};
use crate::model::{ContactImage, ContactQuery, EditableResource, Entry, Feed, GroupQuery};
use crate::store::Secret;
use crate::token::AuthManager;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Protocol version header sent with every request.
pub const GDATA_VERSION: &str = "3.0";

/// Content type of entry bodies sent on save.
pub const ATOM_CONTENT_TYPE: &str = "application/atom+xml";

const GDATA_VERSION_HEADER: HeaderName = HeaderName::from_static("gdata-version");

/// Client for the contacts directory.
///
/// # Example
///
/// ```rust,ignore
/// use gcontacts_core::{ClientConfig, ContactQuery, ContactsClient};
/// use tokio_util::sync::CancellationToken;
///
/// let client = ContactsClient::with_reqwest(auth, ClientConfig::default())?;
/// let feed = client
///     .fetch_feed(&ContactQuery::new(), &CancellationToken::new())
///     .await?;
/// for entry in &feed.entries {
///     println!("{} {}", entry.local_id(), entry.title);
/// }
/// ```
pub struct ContactsClient<A, T> {
    auth: A,
    transport: T,
    config: ClientConfig,
}

impl<A: AuthManager> ContactsClient<A, ReqwestTransport> {
    /// Create a client that talks HTTP through `reqwest`, using the
    /// configured per-request timeout.
    pub fn with_reqwest(auth: A, config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(config.timeout())?;
        Ok(Self::new(auth, transport, config))
    }
}

impl<A: AuthManager, T: Transport> ContactsClient<A, T> {
    pub fn new(auth: A, transport: T, config: ClientConfig) -> Self {
        Self {
            auth,
            transport,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch one page of the contacts feed.
    pub async fn fetch_feed(&self, query: &ContactQuery, cancel: &CancellationToken) -> Result<Feed> {
        let body = self.fetch_feed_raw(query, cancel).await?;
        Ok(decode_feed(&body)?)
    }

    /// Fetch one page of the contacts feed without decoding it.
    pub async fn fetch_feed_raw(
        &self,
        query: &ContactQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let mut url = self.config.contacts_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("max-results", &query.max_results.to_string());
            pairs.append_pair("start-index", &query.start_index.to_string());
            if let Some(q) = query.query.as_deref().filter(|q| !q.is_empty()) {
                pairs.append_pair("q", q);
            }
            if let Some(group) = query.group.as_deref().filter(|g| !g.is_empty()) {
                pairs.append_pair("group", group);
            }
        }

        let response = self
            .with_renewal(cancel, |token| self.request(Method::GET, &url, token))
            .await?;
        Ok(response.body)
    }

    /// Fetch one page of the groups feed.
    pub async fn fetch_groups(&self, query: &GroupQuery, cancel: &CancellationToken) -> Result<Feed> {
        let body = self.fetch_groups_raw(query, cancel).await?;
        Ok(decode_feed(&body)?)
    }

    pub async fn fetch_groups_raw(
        &self,
        query: &GroupQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let mut url = self.config.groups_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("max-results", &query.max_results.to_string());
            pairs.append_pair("start-index", &query.start_index.to_string());
            if let Some(q) = query.query.as_deref().filter(|q| !q.is_empty()) {
                pairs.append_pair("q", q);
            }
        }

        let response = self
            .with_renewal(cancel, |token| self.request(Method::GET, &url, token))
            .await?;
        Ok(response.body)
    }

    /// Fetch a single contact by full entry URI or local id.
    pub async fn fetch_contact(&self, id: &str, cancel: &CancellationToken) -> Result<Entry> {
        let body = self.fetch_contact_raw(id, cancel).await?;
        Ok(decode_entry(&body)?)
    }

    pub async fn fetch_contact_raw(&self, id: &str, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let url = self.entry_url(id)?;
        let response = self
            .with_renewal(cancel, |token| self.request(Method::GET, &url, token))
            .await?;
        Ok(response.body)
    }

    /// Download the photo behind an entry's photo link.
    pub async fn fetch_contact_image(
        &self,
        href: &str,
        cancel: &CancellationToken,
    ) -> Result<ContactImage> {
        let url = Url::parse(href).map_err(|e| ContactsError::RequestBuild {
            message: format!("invalid image URL {:?}: {}", href, e),
        })?;

        let response = self
            .with_renewal(cancel, |token| self.request(Method::GET, &url, token))
            .await?;

        Ok(ContactImage {
            content_type: response.content_type(),
            data: response.body,
        })
    }

    /// Write a resource back and decode the server's copy.
    pub async fn save<R>(&self, resource: &R, cancel: &CancellationToken) -> Result<Entry>
    where
        R: EditableResource + ?Sized,
    {
        let body = self.save_raw(resource, cancel).await?;
        Ok(decode_entry(&body)?)
    }

    /// Write a resource back with a conditional PUT and return the raw
    /// response body.
    pub async fn save_raw<R>(&self, resource: &R, cancel: &CancellationToken) -> Result<Vec<u8>>
    where
        R: EditableResource + ?Sized,
    {
        let body = resource.to_xml().map_err(|e| ContactsError::RequestBuild {
            message: format!("failed to encode entry: {}", e),
        })?;
        let url = self.entry_url(resource.edit_uri())?;
        let etag = resource.etag();

        tracing::info!("saving {}", url);

        let response = self
            .with_renewal(cancel, |token| {
                let mut request = self.request(Method::PUT, &url, token)?;
                request
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(ATOM_CONTENT_TYPE));
                if !etag.is_empty() {
                    let value = HeaderValue::from_str(etag).map_err(|e| {
                        ContactsError::RequestBuild {
                            message: format!("invalid etag {:?}: {}", etag, e),
                        }
                    })?;
                    request.headers.insert(IF_MATCH, value);
                }
                request.body = Some(body.as_bytes().to_vec());
                Ok(request)
            })
            .await?;
        Ok(response.body)
    }

    /// Run one attempt, and on a qualifying failure renew the credential and
    /// run one more. `build` is called once per attempt with that attempt's
    /// token.
    async fn with_renewal<F>(&self, cancel: &CancellationToken, build: F) -> Result<HttpResponse>
    where
        F: Fn(&Secret) -> Result<HttpRequest>,
    {
        let token = cancellable(cancel, async {
            self.auth.access_token().await.map_err(ContactsError::from)
        })
        .await?;

        let error = match self.attempt(cancel, &build, &token).await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };

        if !self.config.retry_policy.should_retry(&error) {
            return Err(error);
        }

        tracing::warn!("request failed, renewing access token and retrying: {}", error);

        let token = cancellable(cancel, async {
            self.auth.force_renew().await.map_err(ContactsError::from)
        })
        .await?;

        self.attempt(cancel, &build, &token).await
    }

    async fn attempt<F>(&self, cancel: &CancellationToken, build: &F, token: &Secret) -> Result<HttpResponse>
    where
        F: Fn(&Secret) -> Result<HttpRequest>,
    {
        let request = build(token)?;
        let url = request.url.to_string();

        let response = cancellable(cancel, self.transport.execute(request)).await?;

        if response.status.as_u16() >= 300 {
            return Err(ContactsError::RemoteRejection {
                url,
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }

        Ok(response)
    }

    fn request(&self, method: Method, url: &Url, token: &Secret) -> Result<HttpRequest> {
        let mut headers = HeaderMap::new();
        headers.insert(GDATA_VERSION_HEADER, HeaderValue::from_static(GDATA_VERSION));

        if !token.is_empty() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
                .map_err(|_| ContactsError::RequestBuild {
                    message: "access token is not a valid header value".to_string(),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        tracing::debug!("{} {}", method, url);

        Ok(HttpRequest {
            method,
            url: url.clone(),
            headers,
            body: None,
        })
    }

    /// Resolve a full entry URI or a bare local id to the entry's URL.
    ///
    /// Full URIs in the read-only `/base/` projection are rewritten to
    /// `/full/`.
    fn entry_url(&self, id: &str) -> Result<Url> {
        if id.is_empty() {
            return Err(ContactsError::RequestBuild {
                message: "empty contact id".to_string(),
            });
        }

        if id.contains("://") {
            let rewritten = id.replace("/base/", "/full/");
            return Url::parse(&rewritten).map_err(|e| ContactsError::RequestBuild {
                message: format!("invalid contact URI {:?}: {}", id, e),
            });
        }

        if id.contains(['/', '?', '#']) {
            return Err(ContactsError::RequestBuild {
                message: format!("invalid contact id {:?}", id),
            });
        }

        self.config
            .contacts_url()?
            .join(id)
            .map_err(|e| ContactsError::RequestBuild {
                message: format!("invalid contact id {:?}: {}", id, e),
            })
    }
}

/// Await `future` unless `cancel` fires first.
async fn cancellable<F, R>(cancel: &CancellationToken, future: F) -> Result<R>
where
    F: Future<Output = Result<R>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ContactsError::Cancelled),
        result = future => result,
    }
}
