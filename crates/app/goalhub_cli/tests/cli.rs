//! CLI tests: run the `goalhub` binary against a temp data dir.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use assert_cmd::Command;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use jsonwebtoken::{EncodingKey, Header, encode};
use predicates::prelude::*;
use serde_json::{Value, json};

/// API URL nothing listens on, so network calls fail fast.
const DEAD_API: &str = "http://127.0.0.1:9/api/v1/";

fn goalhub(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("goalhub").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("GOALHUB_PASSWORD")
        .env_remove("GOALHUB_CSRF_PATH")
        .env("GOALHUB_API_URL", DEAD_API)
        .env("GOALHUB_DATA_DIR", data_dir);
    cmd
}

fn token(exp: i64, admin: bool) -> String {
    encode(
        &Header::default(),
        &json!({
            "user_id": 7,
            "username": "alice",
            "first_name": "Alice",
            "last_name": "Rossi",
            "is_superuser": admin,
            "group": 3,
            "exp": exp,
        }),
        &EncodingKey::from_secret(b"secret"),
    )
    .unwrap()
}

fn write_token(data_dir: &Path, exp: i64, admin: bool) {
    std::fs::write(data_dir.join("access_token"), token(exp, admin)).unwrap();
}

fn future() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}

#[test]
fn version_prints_name() {
    let dir = tempfile::tempdir().unwrap();
    goalhub(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("goalhub_cli"));
}

#[test]
fn status_without_session() {
    let dir = tempfile::tempdir().unwrap();
    goalhub(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("session: not logged in"));
}

#[test]
fn status_with_restored_session() {
    let dir = tempfile::tempdir().unwrap();
    write_token(dir.path(), future(), true);
    goalhub(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("session: active"))
        .stdout(predicate::str::contains("user: Alice Rossi (id 7)"))
        .stdout(predicate::str::contains("admin: true"));
}

#[test]
fn status_clears_expired_session() {
    let dir = tempfile::tempdir().unwrap();
    write_token(dir.path(), chrono::Utc::now().timestamp() - 60, false);
    goalhub(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("expired"));
    assert!(!dir.path().join("access_token").exists());
}

#[test]
fn whoami_requires_login() {
    let dir = tempfile::tempdir().unwrap();
    goalhub(dir.path())
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("login required"));
}

#[test]
fn whoami_prints_claims() {
    let dir = tempfile::tempdir().unwrap();
    write_token(dir.path(), future(), false);
    goalhub(dir.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"user_id\": 7"))
        .stdout(predicate::str::contains("\"isAdmin\": false"))
        .stdout(predicate::str::contains("\"group\": 3"));
}

#[test]
fn logout_clears_session_when_backend_is_down() {
    let dir = tempfile::tempdir().unwrap();
    write_token(dir.path(), future(), false);
    goalhub(dir.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));
    assert!(!dir.path().join("access_token").exists());
}

#[test]
fn login_requires_password() {
    let dir = tempfile::tempdir().unwrap();
    goalhub(dir.path())
        .args(["login", "--username", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("password required"));
}

#[test]
fn login_fails_when_backend_is_down() {
    let dir = tempfile::tempdir().unwrap();
    goalhub(dir.path())
        .args(["login", "--username", "alice", "--password", "x"])
        .assert()
        .failure();
    assert!(!dir.path().join("access_token").exists());
}

const CSRF: &str = "clitoken";

/// Backend double that enforces the CSRF double-submit on every POST and
/// counts how often a CSRF cookie was handed out.
struct Backend {
    api_url: String,
    csrf_grants: Arc<AtomicUsize>,
    _runtime: tokio::runtime::Runtime,
}

fn csrf_ok(headers: &HeaderMap) -> bool {
    headers.get("x-csrftoken").and_then(|v| v.to_str().ok()) == Some(CSRF)
}

fn csrf_failed() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "detail": "CSRF Failed: CSRF token missing." })),
    )
        .into_response()
}

async fn grant_csrf(State(grants): State<Arc<AtomicUsize>>) -> impl IntoResponse {
    grants.fetch_add(1, Ordering::SeqCst);
    (
        [(SET_COOKIE, format!("csrftoken={CSRF}; Path=/"))],
        Json(json!({ "detail": "CSRF cookie set" })),
    )
}

async fn login(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !csrf_ok(&headers) {
        return csrf_failed();
    }
    if body["username"] != "alice" || body["password"] != "x" {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({ "access": token(future(), false) })).into_response()
}

async fn create_group(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !csrf_ok(&headers) {
        return csrf_failed();
    }
    if headers.get(AUTHORIZATION).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let keys: Vec<String> = body
        .as_object()
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();
    (StatusCode::CREATED, Json(json!({ "wire_keys": keys }))).into_response()
}

fn spawn_backend() -> Backend {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let csrf_grants = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/api/v1/auth/csrf/", get(grant_csrf))
        .route("/api/v1/auth/login/", post(login))
        .route("/api/v1/groups/", post(create_group))
        .with_state(csrf_grants.clone());

    let listener = runtime
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let addr = listener.local_addr().unwrap();
    runtime.spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Backend {
        api_url: format!("http://{addr}/api/v1/"),
        csrf_grants,
        _runtime: runtime,
    }
}

#[test]
fn csrf_cookie_carries_over_between_commands() {
    let backend = spawn_backend();
    let dir = tempfile::tempdir().unwrap();
    let run = || {
        let mut cmd = goalhub(dir.path());
        cmd.env("GOALHUB_API_URL", &backend.api_url)
            .env("GOALHUB_CSRF_PATH", "auth/csrf/");
        cmd
    };

    run()
        .args(["login", "--username", "alice", "--password", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as"));
    assert!(dir.path().join("csrf_cookie").exists());

    run()
        .args(["request", "POST", "groups/", "--data", r#"{"groupName": "Team A"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"wireKeys\""))
        .stdout(predicate::str::contains("group_name"));

    // The second process sent the persisted cookie instead of asking again.
    assert_eq!(backend.csrf_grants.load(Ordering::SeqCst), 1);
}

#[test]
fn rejected_csrf_check_is_not_reported_as_bad_credentials() {
    let backend = spawn_backend();
    let dir = tempfile::tempdir().unwrap();
    // The API root sets no cookie, so the login goes out without the header.
    goalhub(dir.path())
        .env("GOALHUB_API_URL", &backend.api_url)
        .args(["login", "--username", "alice", "--password", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CSRF Failed"));
    assert!(!dir.path().join("access_token").exists());
}
