//! Integration tests for the renew-and-retry-once policy.
//!
//! These tests verify that every directory operation:
//! - Succeeds on the second attempt after exactly one forced renewal
//! - Surfaces the second failure when the retry fails too
//! - Never retries cancellation or credential failures

use async_trait::async_trait;
use gcontacts_core::{
    codec::CodecError,
    model::{ContactQuery, EditableResource, Entry, GroupQuery},
    store::Secret,
    token::{AuthError, AuthManager},
    transport::{HttpRequest, HttpResponse, Transport},
    ClientConfig, ContactsClient, ContactsError, RetryPolicy,
};
use parking_lot::Mutex;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

const FEED_BODY: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><id>x/1</id></entry></feed>"#;
const ENTRY_BODY: &str = r#"<entry xmlns="http://www.w3.org/2005/Atom"><id>x/abc123</id><title>A</title></entry>"#;
const IMAGE_BODY: &[u8] = b"\x89PNG";

/// Auth manager that hands out `stale` until renewed, then `fresh-N`.
#[derive(Default)]
struct CountingAuth {
    access_calls: AtomicUsize,
    renew_calls: AtomicUsize,
    fail_access: bool,
    fail_renew: bool,
}

impl CountingAuth {
    fn renewals(&self) -> usize {
        self.renew_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthManager for CountingAuth {
    async fn access_token(&self) -> Result<Secret, AuthError> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_access {
            return Err(AuthError::MissingRefreshCredential);
        }
        Ok(Secret::new("stale"))
    }

    async fn force_renew(&self) -> Result<Secret, AuthError> {
        let n = self.renew_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_renew {
            return Err(AuthError::ExchangeFailed {
                message: "invalid_grant".to_string(),
            });
        }
        Ok(Secret::new(format!("fresh-{}", n)))
    }
}

/// Transport that replays a fixed list of outcomes.
#[derive(Default)]
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, ContactsError>>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<HttpResponse, ContactsError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    fn bearer(&self, index: usize) -> String {
        self.seen.lock()[index]
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ContactsError> {
        let url = request.url.to_string();
        self.seen.lock().push(request);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ContactsError::Transport {
                    url,
                    message: "script exhausted".to_string(),
                })
            })
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Feed,
    Groups,
    Contact,
    Image,
    Save,
}

const ALL_OPS: [Op; 5] = [Op::Feed, Op::Groups, Op::Contact, Op::Image, Op::Save];

fn ok_response(op: Op) -> HttpResponse {
    match op {
        Op::Feed | Op::Groups => HttpResponse::new(StatusCode::OK, FEED_BODY.as_bytes().to_vec()),
        Op::Contact | Op::Save => HttpResponse::new(StatusCode::OK, ENTRY_BODY.as_bytes().to_vec()),
        Op::Image => {
            let mut response = HttpResponse::new(StatusCode::OK, IMAGE_BODY.to_vec());
            response
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
            response
        }
    }
}

fn rejection(status: StatusCode) -> Result<HttpResponse, ContactsError> {
    Ok(HttpResponse::new(status, b"rejected".to_vec()))
}

type Client = ContactsClient<CountingAuth, ScriptedTransport>;

fn client_with(auth: CountingAuth, script: Vec<Result<HttpResponse, ContactsError>>) -> Client {
    ContactsClient::new(auth, ScriptedTransport::new(script), ClientConfig::default())
}

fn sample_entry() -> Entry {
    Entry {
        id: "abc123".to_string(),
        etag: "\"etag\"".to_string(),
        nickname: "Al".to_string(),
        ..Entry::default()
    }
}

async fn run(client: &Client, op: Op, cancel: &CancellationToken) -> Result<(), ContactsError> {
    match op {
        Op::Feed => client.fetch_feed(&ContactQuery::new(), cancel).await.map(drop),
        Op::Groups => client.fetch_groups(&GroupQuery::default(), cancel).await.map(drop),
        Op::Contact => client.fetch_contact("abc123", cancel).await.map(drop),
        Op::Image => client
            .fetch_contact_image("https://www.google.com/m8/feeds/photos/media/default/abc123", cancel)
            .await
            .map(drop),
        Op::Save => client.save(&sample_entry(), cancel).await.map(drop),
    }
}

#[tokio::test]
async fn test_first_attempt_success_needs_no_renewal() {
    for op in ALL_OPS {
        let client = client_with(CountingAuth::default(), vec![Ok(ok_response(op))]);
        run(&client, op, &CancellationToken::new()).await.unwrap();

        assert_eq!(client.auth().renewals(), 0, "{:?}", op);
        assert_eq!(client_transport_calls(&client), 1, "{:?}", op);
    }
}

#[tokio::test]
async fn test_every_operation_succeeds_after_one_renewal() {
    for op in ALL_OPS {
        let client = client_with(
            CountingAuth::default(),
            vec![rejection(StatusCode::UNAUTHORIZED), Ok(ok_response(op))],
        );

        let result = run(&client, op, &CancellationToken::new()).await;
        assert!(result.is_ok(), "{:?}: {:?}", op, result);
        assert_eq!(client.auth().renewals(), 1, "{:?}", op);
        assert_eq!(client_transport_calls(&client), 2, "{:?}", op);
    }
}

#[tokio::test]
async fn test_retry_uses_renewed_token() {
    let client = client_with(
        CountingAuth::default(),
        vec![rejection(StatusCode::UNAUTHORIZED), Ok(ok_response(Op::Feed))],
    );
    run(&client, Op::Feed, &CancellationToken::new()).await.unwrap();

    let transport = transport(&client);
    assert_eq!(transport.bearer(0), "Bearer stale");
    assert_eq!(transport.bearer(1), "Bearer fresh-1");
}

#[tokio::test]
async fn test_every_operation_fails_after_second_failure() {
    for op in ALL_OPS {
        let client = client_with(
            CountingAuth::default(),
            vec![
                rejection(StatusCode::INTERNAL_SERVER_ERROR),
                rejection(StatusCode::SERVICE_UNAVAILABLE),
            ],
        );

        let err = run(&client, op, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE), "{:?}", op);
        assert_eq!(client.auth().renewals(), 1, "{:?}", op);
        assert_eq!(client_transport_calls(&client), 2, "{:?}", op);
    }
}

#[tokio::test]
async fn test_transport_error_is_retried() {
    let client = client_with(
        CountingAuth::default(),
        vec![
            Err(ContactsError::Transport {
                url: "https://www.google.com/".to_string(),
                message: "connection reset".to_string(),
            }),
            Ok(ok_response(Op::Feed)),
        ],
    );

    run(&client, Op::Feed, &CancellationToken::new()).await.unwrap();
    assert_eq!(client.auth().renewals(), 1);
}

#[tokio::test]
async fn test_unauthorized_only_policy() {
    let config = ClientConfig::default().with_retry_policy(RetryPolicy::UnauthorizedOnly);

    let client = ContactsClient::new(
        CountingAuth::default(),
        ScriptedTransport::new(vec![rejection(StatusCode::INTERNAL_SERVER_ERROR)]),
        config.clone(),
    );
    let err = run(&client, Op::Feed, &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(client.auth().renewals(), 0);

    let client = ContactsClient::new(
        CountingAuth::default(),
        ScriptedTransport::new(vec![
            rejection(StatusCode::UNAUTHORIZED),
            Ok(ok_response(Op::Feed)),
        ]),
        config,
    );
    run(&client, Op::Feed, &CancellationToken::new()).await.unwrap();
    assert_eq!(client.auth().renewals(), 1);
}

#[tokio::test]
async fn test_access_token_failure_is_not_retried() {
    let auth = CountingAuth {
        fail_access: true,
        ..CountingAuth::default()
    };
    let client = client_with(auth, vec![]);

    let err = run(&client, Op::Feed, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ContactsError::Auth(AuthError::MissingRefreshCredential)));
    assert_eq!(client.auth().renewals(), 0);
    assert_eq!(client_transport_calls(&client), 0);
}

#[tokio::test]
async fn test_renewal_failure_surfaces() {
    let auth = CountingAuth {
        fail_renew: true,
        ..CountingAuth::default()
    };
    let client = client_with(auth, vec![rejection(StatusCode::UNAUTHORIZED)]);

    let err = run(&client, Op::Contact, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ContactsError::Auth(AuthError::ExchangeFailed { .. })));
    assert_eq!(client_transport_calls(&client), 1);
}

#[tokio::test]
async fn test_decode_failure_is_not_retried() {
    let client = client_with(
        CountingAuth::default(),
        vec![Ok(HttpResponse::new(StatusCode::OK, b"<feed><entry>".to_vec()))],
    );

    let err = run(&client, Op::Feed, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ContactsError::Decode(_)));
    assert_eq!(client.auth().renewals(), 0);
    assert_eq!(client_transport_calls(&client), 1);
}

/// Transport that cancels the caller's token mid-request and never answers.
struct CancellingTransport {
    cancel: CancellationToken,
    calls: AtomicUsize,
}

#[async_trait]
impl Transport for CancellingTransport {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ContactsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.cancel.cancel();
        std::future::pending::<Result<HttpResponse, ContactsError>>().await
    }
}

#[tokio::test]
async fn test_cancellation_is_not_retried() {
    let cancel = CancellationToken::new();
    let client = ContactsClient::new(
        CountingAuth::default(),
        CancellingTransport {
            cancel: cancel.clone(),
            calls: AtomicUsize::new(0),
        },
        ClientConfig::default(),
    );

    let err = client
        .fetch_feed(&ContactQuery::new(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ContactsError::Cancelled));
    assert_eq!(client.auth().renewals(), 0);
}

/// Resource that counts how often it is serialized.
struct CountingResource {
    encodes: AtomicUsize,
}

impl EditableResource for CountingResource {
    fn edit_uri(&self) -> &str {
        "https://www.google.com/m8/feeds/contacts/default/full/abc123"
    }

    fn etag(&self) -> &str {
        "\"v1\""
    }

    fn to_xml(&self) -> Result<String, CodecError> {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        Ok(ENTRY_BODY.to_string())
    }
}

#[tokio::test]
async fn test_save_encodes_once_across_retry() {
    let client = client_with(
        CountingAuth::default(),
        vec![rejection(StatusCode::PRECONDITION_FAILED), Ok(ok_response(Op::Save))],
    );
    let resource = CountingResource {
        encodes: AtomicUsize::new(0),
    };

    let saved = client.save(&resource, &CancellationToken::new()).await.unwrap();
    assert_eq!(saved.local_id(), "abc123");
    assert_eq!(resource.encodes.load(Ordering::SeqCst), 1);

    let transport = transport(&client);
    let seen = transport.seen.lock();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].body, seen[1].body);
    assert_eq!(seen[1].headers.get("If-Match").unwrap(), "\"v1\"");
}

fn transport(client: &Client) -> &ScriptedTransport {
    client.transport()
}

fn client_transport_calls(client: &Client) -> usize {
    transport(client).calls()
}
