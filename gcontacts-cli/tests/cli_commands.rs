//! Integration tests for the gcontacts binary.
//!
//! These tests run the built binary against a mock directory server, with
//! the host and token endpoint pointed at it through a config file.

use std::path::{Path, PathBuf};
use std::process::Output;
use tempfile::TempDir;
use tokio::process::Command;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const ENTRY: &str = r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005" xmlns:gContact="http://schemas.google.com/contact/2008" gd:etag="&quot;v1&quot;">
  <id>{base}/m8/feeds/contacts/default/base/abc123</id>
  <title>Alice Smith</title>
  <gContact:nickname>Al</gContact:nickname>
</entry>"#;

/// The entry document, with its id on `server`.
fn entry(server: &MockServer) -> String {
    ENTRY.replace("{base}", &server.uri())
}

/// Write a config file and credential file pointing at `server`.
fn setup(server: &MockServer) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let auth_file = dir.path().join("auth.json");
    std::fs::write(
        &auth_file,
        r#"{"refresh_token": "refresh", "access_token": "cached"}"#,
    )
    .unwrap();

    let config_file = dir.path().join("config.toml");
    std::fs::write(
        &config_file,
        format!(
            r#"client_id = "test-id"
client_secret = "test-secret"
token_url = "{uri}/token"
auth_file = "{auth}"

[client]
host = "{host}"
use_https = false
"#,
            uri = server.uri(),
            auth = auth_file.display(),
            host = server.address(),
        ),
    )
    .unwrap();

    (dir, config_file)
}

async fn gcontacts(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gcontacts"))
        .env_remove("CLIENT_ID")
        .env_remove("CLIENT_SECRET")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_fetch_raw_prints_xml() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/m8/feeds/contacts/default/full/abc123"))
        .and(header("Authorization", "Bearer cached"))
        .respond_with(ResponseTemplate::new(200).set_body_string(entry(&server)))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, config) = setup(&server);
    let output = gcontacts(&config, &["--raw", "fetch", "abc123"]).await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<gContact:nickname>Al</gContact:nickname>"));
}

#[tokio::test]
async fn test_update_nickname_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/m8/feeds/contacts/default/full/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(entry(&server)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/m8/feeds/contacts/default/full/abc123"))
        .and(header("If-Match", "\"v1\""))
        .and(body_string_contains("<gContact:nickname>Ally</gContact:nickname>"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(entry(&server).replace(">Al<", ">Ally<")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, config) = setup(&server);
    let output = gcontacts(&config, &["update_nickname", "abc123", "Ally"]).await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ORIGINAL ENTRY:"));
    assert!(stdout.contains("UPDATED ENTRY:"));
    assert!(stdout.contains("\"Ally\""));
}

#[tokio::test]
async fn test_update_nickname_rejects_raw() {
    let server = MockServer::start().await;
    let (_dir, config) = setup(&server);

    let output = gcontacts(&config, &["--raw", "update_nickname", "abc123", "Ally"]).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("update_nickname doesn't support --raw"));
}

#[tokio::test]
async fn test_remote_error_exits_non_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/m8/feeds/contacts/default/full/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Contact not found."))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"access_token": "renewed"}"#),
        )
        .mount(&server)
        .await;

    let (_dir, config) = setup(&server);
    let output = gcontacts(&config, &["fetch", "gone"]).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to fetch contact gone"));
    assert!(stderr.contains("404"));
}
