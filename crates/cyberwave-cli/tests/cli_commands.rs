use assert_cmd::Command;
use mockito::Server;
use predicates::prelude::*;
use serde_json::json;
use std::path::Path;
use tempfile::tempdir;

const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

fn base_cmd(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cyberwave").expect("binary");
    cmd.env("CYBERWAVE_CONFIG_DIR", config_dir)
        .env("CYBERWAVE_NO_KEYRING", "1")
        .env_remove("CYBERWAVE_BACKEND_URL")
        .env_remove("CYBERWAVE_ENVIRONMENT");
    cmd
}

fn grant_body() -> serde_json::Value {
    json!({
        "access_token": "access-1",
        "refresh_token": "refresh-1",
        "token_type": "Bearer",
        "expires_in": 3600,
        "user": {"email": "edge@example.com", "workspace_id": "ws-1"}
    })
}

#[test]
fn whoami_reports_a_stable_node_identity() {
    let dir = tempdir().expect("tempdir");

    let first = base_cmd(dir.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Node ID:       edge_"))
        .get_output()
        .stdout
        .clone();
    let second = base_cmd(dir.path())
        .arg("whoami")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let node_id_line = |out: &[u8]| {
        String::from_utf8_lossy(out)
            .lines()
            .find(|line| line.starts_with("Node ID:"))
            .map(str::to_string)
    };
    assert_eq!(node_id_line(&first), node_id_line(&second));
}

#[test]
fn config_set_get_and_list() {
    let dir = tempdir().expect("tempdir");

    base_cmd(dir.path())
        .args(["config", "set", "environment", "staging"])
        .assert()
        .success();

    base_cmd(dir.path())
        .args(["config", "get", "environment"])
        .assert()
        .success()
        .stdout(predicate::str::contains("staging"));

    base_cmd(dir.path())
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("environment=staging"));
}

#[test]
fn config_set_rejects_unknown_environment() {
    let dir = tempdir().expect("tempdir");

    base_cmd(dir.path())
        .args(["config", "set", "environment", "mystery"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown environment"));
}

#[test]
fn status_is_offline_without_backend_or_credentials() {
    let dir = tempdir().expect("tempdir");

    base_cmd(dir.path())
        .args(["--backend-url", UNREACHABLE_URL, "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mode:         offline"))
        .stdout(predicate::str::contains("not authenticated"));
}

#[test]
fn status_is_hybrid_with_cached_credentials() {
    let dir = tempdir().expect("tempdir");
    let expires_at = chrono::Utc::now() + chrono::Duration::seconds(3600);
    std::fs::create_dir_all(dir.path()).expect("dir");
    std::fs::write(
        dir.path().join("credentials.json"),
        json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "token_type": "Bearer",
            "expires_at": expires_at.to_rfc3339(),
            "email": "edge@example.com"
        })
        .to_string(),
    )
    .expect("write credentials");

    base_cmd(dir.path())
        .args(["--backend-url", UNREACHABLE_URL, "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mode:         hybrid"))
        .stdout(predicate::str::contains("edge@example.com"));
}

#[test]
fn login_then_status_then_logout() {
    let dir = tempdir().expect("tempdir");
    let mut server = Server::new();

    server
        .mock("GET", "/health")
        .with_status(200)
        .with_body(json!({"status": "ok"}).to_string())
        .create();
    server
        .mock("POST", "/auth/device/initiate")
        .with_status(200)
        .with_body(
            json!({
                "device_code": "opaque-device-code",
                "user_code": "WDJB-MJHT",
                "verification_url": "http://localhost:3000/activate",
                "expires_in": 600,
                "interval": 1
            })
            .to_string(),
        )
        .create();
    server
        .mock("POST", "/auth/device/token")
        .with_status(200)
        .with_body(grant_body().to_string())
        .create();
    server
        .mock("POST", "/api/v1/edges/register")
        .with_status(200)
        .with_body("{}")
        .create();
    server
        .mock("POST", "/api/v1/edges/heartbeat")
        .with_status(200)
        .with_body("{}")
        .create();

    base_cmd(dir.path())
        .args(["--backend-url", &server.url(), "login", "--no-browser"])
        .assert()
        .success()
        .stdout(predicate::str::contains("enter the code: WDJB-MJHT"))
        .stdout(predicate::str::contains("Logged in as edge@example.com"))
        .stdout(predicate::str::contains("Workspace: ws-1"));

    // The fallback credentials file is in place (the keystore is disabled
    // in this test environment).
    assert!(dir.path().join("credentials.json").exists());

    // Workspace default was captured into the persisted config.
    base_cmd(dir.path())
        .args(["config", "get", "workspace_id"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ws-1"));

    base_cmd(dir.path())
        .args(["--backend-url", &server.url(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mode:         online"))
        .stdout(predicate::str::contains("valid (edge@example.com"));

    base_cmd(dir.path())
        .args(["--backend-url", &server.url(), "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    base_cmd(dir.path())
        .args(["--backend-url", &server.url(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not authenticated"));
}

#[test]
fn expired_device_authorization_fails_with_instructions() {
    let dir = tempdir().expect("tempdir");
    let mut server = Server::new();

    server
        .mock("GET", "/health")
        .with_status(200)
        .with_body(json!({"status": "ok"}).to_string())
        .create();
    server
        .mock("POST", "/auth/device/initiate")
        .with_status(200)
        .with_body(
            json!({
                "device_code": "opaque-device-code",
                "user_code": "WDJB-MJHT",
                "verification_url": "http://localhost:3000/activate",
                "expires_in": 600,
                "interval": 1
            })
            .to_string(),
        )
        .create();
    server
        .mock("POST", "/auth/device/token")
        .with_status(410)
        .with_body(json!({"error": "expired_token"}).to_string())
        .create();

    base_cmd(dir.path())
        .args(["--backend-url", &server.url(), "login", "--no-browser"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("expired"));
}

#[test]
fn login_fails_fast_when_backend_unreachable() {
    let dir = tempdir().expect("tempdir");

    base_cmd(dir.path())
        .args(["--backend-url", UNREACHABLE_URL, "login", "--no-browser"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("backend unreachable"));
}

#[test]
fn sync_without_credentials_exits_with_auth_code() {
    let dir = tempdir().expect("tempdir");
    let mut server = Server::new();
    server
        .mock("GET", "/health")
        .with_status(200)
        .with_body(json!({"status": "ok"}).to_string())
        .create();

    base_cmd(dir.path())
        .args(["--backend-url", &server.url(), "sync"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("not authenticated"));
}

#[test]
fn logout_is_idempotent() {
    let dir = tempdir().expect("tempdir");

    base_cmd(dir.path())
        .args(["--backend-url", UNREACHABLE_URL, "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));
}
