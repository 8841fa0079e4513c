//! End-to-end session flows against a loopback backend.
//!
//! Wires the session manager to the reqwest transport, the HTTP refresh
//! client and file storage, then drives it against a small axum server.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};
use warden_application::{KeyValueStorage, RefreshFailure, SessionManager};
use warden_domain::{ApiRequest, Claims, SessionSettings, SessionState, SessionStatus, encode_unsigned};
use warden_infrastructure::{FileStorage, HttpRefreshClient, ReqwestTransport, SystemClock};

type Manager = SessionManager<ReqwestTransport, HttpRefreshClient>;

/// Credential for `subject` expiring `secs` from now (negative = already expired).
fn token(subject: &str, secs: i64) -> String {
    let now = Utc::now();
    encode_unsigned(
        &Claims::expiring_at(now + chrono::Duration::seconds(secs))
            .with_subject(subject)
            .with_issued_at(now),
    )
}

struct Backend {
    /// Bearer value `/posts` accepts.
    valid_access: Mutex<String>,
    /// Refresh credential the refresh endpoint accepts.
    valid_refresh: String,
    /// Access credential handed out by a successful refresh.
    next_access: String,
    /// Rotated refresh credential, if any.
    next_refresh: Option<String>,
    /// When false, refreshed credentials are still refused by `/posts`.
    accept_refreshed: bool,
    refresh_calls: AtomicUsize,
    posts_calls: AtomicUsize,
}

impl Backend {
    fn new(valid_refresh: &str, next_access: &str) -> Self {
        Self {
            valid_access: Mutex::new(String::new()),
            valid_refresh: valid_refresh.to_string(),
            next_access: next_access.to_string(),
            next_refresh: None,
            accept_refreshed: true,
            refresh_calls: AtomicUsize::new(0),
            posts_calls: AtomicUsize::new(0),
        }
    }
}

async fn refresh(
    State(backend): State<Arc<Backend>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    // Keep the exchange in flight long enough for concurrent callers to queue.
    tokio::time::sleep(Duration::from_millis(100)).await;

    if body["refresh"].as_str() != Some(backend.valid_refresh.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is invalid or expired"})),
        );
    }
    if backend.accept_refreshed {
        *backend.valid_access.lock().unwrap() = backend.next_access.clone();
    }
    let mut grant = json!({"access": backend.next_access});
    if let Some(rotated) = &backend.next_refresh {
        grant["refresh"] = json!(rotated);
    }
    (StatusCode::OK, Json(grant))
}

async fn posts(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> (StatusCode, String) {
    backend.posts_calls.fetch_add(1, Ordering::SeqCst);
    let expected = format!("Bearer {}", backend.valid_access.lock().unwrap());
    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if presented == expected {
        (StatusCode::OK, "[]".to_string())
    } else {
        (StatusCode::UNAUTHORIZED, r#"{"detail":"unauthorized"}"#.to_string())
    }
}

async fn spawn_backend(backend: Arc<Backend>) -> SocketAddr {
    let router = Router::new()
        .route("/token/refresh", post(refresh))
        .route("/posts", get(posts))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

struct Harness {
    _dir: TempDir,
    storage: Arc<FileStorage>,
    manager: Manager,
    expired: Arc<Mutex<Vec<String>>>,
}

async fn harness(backend: Arc<Backend>) -> Harness {
    let addr = spawn_backend(backend).await;
    let dir = tempdir().unwrap();
    let settings = SessionSettings {
        base_url: format!("http://{addr}"),
        refresh_timeout_seconds: 5,
        request_timeout_seconds: 5,
        storage_path: Some(dir.path().join("credentials.json")),
        ..SessionSettings::default()
    };
    let storage = Arc::new(FileStorage::new(dir.path().join("credentials.json")));
    let manager = SessionManager::new(
        &settings,
        storage.clone(),
        Arc::new(SystemClock::new()),
        ReqwestTransport::new(&settings).unwrap(),
        HttpRefreshClient::new(&settings).unwrap(),
    );
    let expired = Arc::new(Mutex::new(Vec::new()));
    let log = expired.clone();
    // Kept registered for the whole test.
    let _subscription = manager.subscribe(move |event| log.lock().unwrap().push(event.reason.clone()));
    Harness {
        _dir: dir,
        storage,
        manager,
        expired,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_callers_share_one_refresh() {
    let refresh_v1 = token("refresh_v1", 86_400);
    let access_v2 = token("access_v2", 3600);
    let backend = Arc::new(Backend::new(&refresh_v1, &access_v2));
    let h = harness(backend.clone()).await;
    h.manager
        .login(&token("access_v1", -60), Some(&refresh_v1))
        .unwrap();
    assert_eq!(h.manager.state(), SessionState::Refreshing);

    let (a, b, c) = tokio::join!(
        h.manager.ensure_valid_access_token(),
        h.manager.ensure_valid_access_token(),
        h.manager.ensure_valid_access_token(),
    );

    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!([a.unwrap(), b.unwrap(), c.unwrap()], [
        access_v2.clone(),
        access_v2.clone(),
        access_v2.clone()
    ]);
    assert_eq!(h.storage.get("access_token").unwrap(), Some(access_v2));
    assert_eq!(h.storage.get("refresh_token").unwrap(), Some(refresh_v1));
    assert_eq!(h.manager.state(), SessionState::Authenticated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_401s_recover_with_one_refresh() {
    let refresh_v1 = token("refresh_v1", 86_400);
    let access_v2 = token("access_v2", 3600);
    let backend = Arc::new(Backend::new(&refresh_v1, &access_v2));
    *backend.valid_access.lock().unwrap() = "revoked".to_string();
    let h = harness(backend.clone()).await;
    // Locally still valid, so only the backend's 401 reveals the problem.
    h.manager
        .login(&token("access_v1", 3600), Some(&refresh_v1))
        .unwrap();

    let (a, b, c) = tokio::join!(
        h.manager.execute(ApiRequest::get("/posts")),
        h.manager.execute(ApiRequest::get("/posts")),
        h.manager.execute(ApiRequest::get("/posts")),
    );

    let statuses = [a.unwrap().status, b.unwrap().status, c.unwrap().status];
    assert_eq!(statuses, [200, 200, 200]);
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.posts_calls.load(Ordering::SeqCst), 6);
    assert!(h.expired.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rotated_refresh_credential_is_persisted() {
    let refresh_v1 = token("refresh_v1", 86_400);
    let refresh_v2 = token("refresh_v2", 86_400);
    let mut backend = Backend::new(&refresh_v1, &token("access_v2", 3600));
    backend.next_refresh = Some(refresh_v2.clone());
    let h = harness(Arc::new(backend)).await;
    h.manager.login(&token("access_v1", -60), Some(&refresh_v1)).unwrap();

    h.manager.ensure_valid_access_token().await.unwrap();

    let reopened = FileStorage::new(h.storage.path());
    assert_eq!(reopened.get("refresh_token").unwrap(), Some(refresh_v2));
}

#[tokio::test]
async fn test_expired_refresh_fails_without_network() {
    let backend = Arc::new(Backend::new("unused", "unused"));
    let h = harness(backend.clone()).await;
    h.manager
        .login(&token("access_v1", -60), Some(&token("refresh_v1", -1)))
        .unwrap();

    let failure = h.manager.ensure_valid_access_token().await.unwrap_err();

    assert_eq!(failure, RefreshFailure::refresh_expired());
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.storage.get("access_token").unwrap(), None);
    assert_eq!(h.storage.get("refresh_token").unwrap(), None);
    assert_eq!(*h.expired.lock().unwrap(), vec!["refresh token expired"]);
    assert_eq!(h.manager.health().status, SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn test_rejected_refresh_returns_original_401() {
    let backend = Arc::new(Backend::new(&token("other", 86_400), "unused"));
    let h = harness(backend.clone()).await;
    h.manager
        .login(&token("access_v1", 3600), Some(&token("refresh_v1", 86_400)))
        .unwrap();

    let response = h.manager.execute(ApiRequest::get("/posts")).await.unwrap();

    assert_eq!(response.status, 401);
    assert_eq!(response.body, r#"{"detail":"unauthorized"}"#);
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.posts_calls.load(Ordering::SeqCst), 1);
    assert_eq!(*h.expired.lock().unwrap(), vec!["refresh rejected"]);
    assert_eq!(h.manager.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_retried_request_is_not_retried_again() {
    let refresh_v1 = token("refresh_v1", 86_400);
    let mut backend = Backend::new(&refresh_v1, &token("access_v2", 3600));
    backend.accept_refreshed = false;
    let backend = Arc::new(backend);
    let h = harness(backend.clone()).await;
    h.manager
        .login(&token("access_v1", 3600), Some(&refresh_v1))
        .unwrap();

    let response = h.manager.execute(ApiRequest::get("/posts")).await.unwrap();

    assert_eq!(response.status, 401);
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.posts_calls.load(Ordering::SeqCst), 2);
    assert!(h.expired.lock().unwrap().is_empty());
    assert!(h.manager.store().has_credentials().unwrap());
}

#[tokio::test]
async fn test_logout_clears_file_and_notifies() {
    let backend = Arc::new(Backend::new("unused", "unused"));
    let h = harness(backend).await;
    h.manager
        .login(&token("access_v1", 3600), Some(&token("refresh_v1", 86_400)))
        .unwrap();
    assert_eq!(h.manager.health().status, SessionStatus::Healthy);

    h.manager.logout("user logout");

    let content = std::fs::read_to_string(h.storage.path()).unwrap();
    assert_eq!(content, "{}\n");
    assert_eq!(*h.expired.lock().unwrap(), vec!["user logout"]);
    assert_eq!(h.manager.health().status, SessionStatus::Unauthenticated);
}
