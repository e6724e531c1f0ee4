//! Integration tests for the refresh-token exchange and the auth manager.
//!
//! These tests verify that:
//! - The exchanger posts the expected form and reads `access_token`
//! - Endpoint errors surface as exchange failures
//! - A cached token is handed out without touching the network
//! - A missing access token triggers one exchange that is persisted to disk
//! - A missing refresh token fails without a network call

use gcontacts_core::{
    oauth::{OAuthClientConfig, RefreshTokenExchanger},
    store::{CredentialRecord, CredentialStore, FileCredentialStore, Secret},
    token::{AuthError, AuthManager, TokenExchanger},
    token_manager::DefaultAuthManager,
};
use tempfile::TempDir;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn exchanger_for(server: &MockServer) -> RefreshTokenExchanger {
    RefreshTokenExchanger::new(
        OAuthClientConfig::new("test-client-id", "test-client-secret")
            .with_token_url(format!("{}/token", server.uri())),
    )
}

async fn file_store(dir: &TempDir, record: Option<CredentialRecord>) -> FileCredentialStore {
    let store = FileCredentialStore::new(dir.path().join("auth.json"));
    if let Some(record) = record {
        store.save(&record).await.unwrap();
    }
    store
}

#[tokio::test]
async fn test_exchange_posts_refresh_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=my-refresh-token"))
        .and(body_string_contains("client_id=test-client-id"))
        .and(body_string_contains("client_secret=test-client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "new-access-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = exchanger_for(&server)
        .exchange(&Secret::new("my-refresh-token"))
        .await
        .unwrap();
    assert_eq!(token.expose(), "new-access-token");
}

#[tokio::test]
async fn test_exchange_rejected_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .mount(&server)
        .await;

    let err = exchanger_for(&server)
        .exchange(&Secret::new("revoked"))
        .await
        .unwrap_err();
    match err {
        AuthError::ExchangeFailed { message } => {
            assert!(message.contains("invalid_grant"));
            assert!(message.contains("expired or revoked"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_exchange_missing_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token_type": "Bearer" })),
        )
        .mount(&server)
        .await;

    let err = exchanger_for(&server)
        .exchange(&Secret::new("refresh"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ExchangeFailed { .. }));
}

#[tokio::test]
async fn test_exchange_unparseable_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = exchanger_for(&server)
        .exchange(&Secret::new("refresh"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_cached_token_skips_exchange() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = file_store(
        &dir,
        Some(CredentialRecord::new("refresh").with_access_token("cached-token")),
    )
    .await;
    let manager = DefaultAuthManager::new(store, exchanger_for(&server));

    let token = manager.access_token().await.unwrap();
    assert_eq!(token.expose(), "cached-token");
}

#[tokio::test]
async fn test_missing_access_token_is_exchanged_and_persisted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "exchanged-token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("auth.json"),
        r#"{"refresh_token": "refresh", "access_token": null}"#,
    )
    .unwrap();

    let manager = DefaultAuthManager::new(
        FileCredentialStore::new(dir.path().join("auth.json")),
        exchanger_for(&server),
    );

    let token = manager.access_token().await.unwrap();
    assert_eq!(token.expose(), "exchanged-token");

    // Second call is served from the file.
    let token = manager.access_token().await.unwrap();
    assert_eq!(token.expose(), "exchanged-token");

    let on_disk = FileCredentialStore::new(dir.path().join("auth.json"))
        .load()
        .await
        .unwrap();
    assert_eq!(on_disk.refresh_token().expose(), "refresh");
    assert_eq!(on_disk.access_token().expose(), "exchanged-token");
}

#[tokio::test]
async fn test_force_renew_replaces_cached_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "renewed-token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = file_store(
        &dir,
        Some(CredentialRecord::new("refresh").with_access_token("stale-token")),
    )
    .await;
    let manager = DefaultAuthManager::new(store, exchanger_for(&server));

    let token = manager.force_renew().await.unwrap();
    assert_eq!(token.expose(), "renewed-token");
    assert_eq!(manager.access_token().await.unwrap().expose(), "renewed-token");
}

#[tokio::test]
async fn test_missing_refresh_token_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("auth.json"), r#"{"refresh_token": ""}"#).unwrap();

    let manager = DefaultAuthManager::new(
        FileCredentialStore::new(dir.path().join("auth.json")),
        exchanger_for(&server),
    );

    let err = manager.access_token().await.unwrap_err();
    assert!(matches!(err, AuthError::MissingRefreshCredential));
    assert_eq!(err.to_string(), "no refresh token provided");
}

#[tokio::test]
async fn test_missing_credential_file() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let manager = DefaultAuthManager::new(
        FileCredentialStore::new(dir.path().join("absent.json")),
        exchanger_for(&server),
    );

    let err = manager.access_token().await.unwrap_err();
    assert!(matches!(err, AuthError::CredentialLoad(_)));
}
