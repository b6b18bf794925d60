//! Integration tests for `qrm login`, `qrm list` and `qrm session`.
//!
//! Each test gets its own QRM_HOME, so the session lands in a temp
//! `storage.json`, and talks to a mock API through QRM_API_BASE_URL.

use std::fs;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn temp_qrm_home() -> TempDir {
    TempDir::new().expect("create temp qrm home")
}

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn qrm(home: &TempDir, server: &MockServer) -> Command {
    let mut cmd = cargo_bin_cmd!("qrm");
    cmd.env("QRM_HOME", home.path())
        .env("QRM_API_BASE_URL", server.uri())
        .env("QRM_BLOCK_REAL_API", "1")
        .env_remove("QRM_HOST_STORAGE")
        .env_remove("QRM_API_KEY");
    cmd
}

fn write_session(home: &TempDir, api_key: &str, user_id: &str) {
    fs::write(
        home.path().join("storage.json"),
        json!({"token": api_key, "userId": user_id}).to_string(),
    )
    .unwrap();
}

async fn mount_validate(server: &MockServer, api_key: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/1/validate"))
        .and(query_param("api_key", api_key))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_list(server: &MockServer, api_key: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/1/list"))
        .and(query_param("api_key", api_key))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn two_codes() -> serde_json::Value {
    json!({
        "success": true,
        "data": {"content": [
            {"ID": 1, "NAME": "Site", "TYPE": "url", "CONTENT": "https://example.com",
             "SHORT_LINK": "https://s.example/abc"},
            {"ID": 2, "NAME": "Card", "TYPE": "vcard", "CONTENT": "BEGIN:VCARD",
             "QR_IMAGE": "/upload/2.png", "PARAMS": {"color": "black"}}
        ]}
    })
}

#[tokio::test]
async fn test_login_saves_session_and_prints_codes() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_qrm_home();
    let server = MockServer::start().await;
    mount_validate(
        &server,
        "good-key",
        json!({"success": true, "data": {"user_id": "42"}}),
    )
    .await;
    mount_list(&server, "good-key", two_codes()).await;

    qrm(&home, &server)
        .args(["login", "good-key"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome, User ID: 42!"))
        .stdout(predicate::str::contains("- Site (Type: url)"))
        .stdout(predicate::str::contains("Short link: https://s.example/abc"))
        .stdout(predicate::str::contains(format!(
            "Image: {}/upload/2.png",
            server.uri()
        )))
        .stdout(predicate::str::contains(r#"Params: {"color":"black"}"#));

    let stored: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(home.path().join("storage.json")).unwrap())
            .unwrap();
    assert_eq!(stored["token"], "good-key");
    assert_eq!(stored["userId"], "42");
}

#[tokio::test]
async fn test_login_with_rejected_key_fails() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_qrm_home();
    let server = MockServer::start().await;
    mount_validate(
        &server,
        "bad-key",
        json!({"success": false, "message": "Token not found"}),
    )
    .await;

    qrm(&home, &server)
        .args(["login", "bad-key"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Error: Token not found"))
        .stdout(predicate::str::contains("Enter the token from the website"))
        .stderr(predicate::str::contains("Login failed"));

    assert!(!home.path().join("storage.json").exists());
}

#[tokio::test]
async fn test_login_with_revoked_stored_key_fails() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_qrm_home();
    write_session(&home, "A", "U");
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/1/validate"))
        .and(query_param("api_key", "A"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"success": false, "message": "revoked"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_list(&server, "A", two_codes()).await;

    qrm(&home, &server)
        .args(["login", "A"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Error: revoked"))
        .stderr(predicate::str::contains("Login failed"));

    let stored: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(home.path().join("storage.json")).unwrap())
            .unwrap();
    assert_eq!(stored["token"], "A");
    assert_eq!(stored["userId"], "U");
}

#[tokio::test]
async fn test_list_without_session_fails() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_qrm_home();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    qrm(&home, &server)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[tokio::test]
async fn test_list_uses_stored_session_without_revalidating() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_qrm_home();
    write_session(&home, "stored-key", "7");
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/1/validate"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    mount_list(&server, "stored-key", two_codes()).await;

    qrm(&home, &server)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome, User ID: 7!"))
        .stdout(predicate::str::contains("- Card (Type: vcard)"));
}

#[tokio::test]
async fn test_list_table_output() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_qrm_home();
    write_session(&home, "stored-key", "7");
    let server = MockServer::start().await;
    mount_list(&server, "stored-key", two_codes()).await;

    qrm(&home, &server)
        .args(["list", "--table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Short link"))
        .stdout(predicate::str::contains("Site"))
        .stdout(predicate::str::contains("Card"));
}

#[tokio::test]
async fn test_list_missing_content_reports_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_qrm_home();
    write_session(&home, "stored-key", "7");
    let server = MockServer::start().await;
    mount_list(&server, "stored-key", json!({"success": true, "data": {}})).await;

    qrm(&home, &server)
        .arg("list")
        .assert()
        .failure()
        .stdout(predicate::str::contains("No QR codes found."))
        .stderr(predicate::str::contains(
            "QR code list is missing from the response",
        ));
}

#[tokio::test]
async fn test_session_show_masks_key() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_qrm_home();
    write_session(&home, "secret-api-key", "42");
    let server = MockServer::start().await;

    qrm(&home, &server)
        .args(["session", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User ID: 42"))
        .stdout(predicate::str::contains("secr"))
        .stdout(predicate::str::contains("secret-api-key").not());

    qrm(&home, &server)
        .args(["session", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("storage.json"));
}
