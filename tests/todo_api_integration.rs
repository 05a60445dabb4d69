//! HTTP-level integration tests
//!
//! Drive the full router (middleware included) with `tower::ServiceExt::oneshot`
//! against the in-memory store or a store with injected faults. No database or
//! listening socket is needed.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use todo_service::config::Settings;
use todo_service::resilience::{CircuitBreaker, CircuitBreakerConfig, TripPolicy};
use todo_service::server::{create_app, AppState};
use todo_service::todo::{MemoryTodoStore, StoreError, Todo, TodoStore};

/// Store whose calls fail while `failing` is set, counting every invocation.
struct FlakyStore {
    inner: MemoryTodoStore,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FlakyStore {
    fn new(failing: bool) -> Self {
        Self {
            inner: MemoryTodoStore::new(),
            failing: AtomicBool::new(failing),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected fault".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TodoStore for FlakyStore {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        self.check()?;
        self.inner.list().await
    }

    async fn create(&self, task: &str) -> Result<Todo, StoreError> {
        self.check()?;
        self.inner.create(task).await
    }

    async fn set_completed(&self, id: i32, completed: bool) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.set_completed(id, completed).await
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.delete(id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

fn memory_app() -> Router {
    let store: Arc<dyn TodoStore> = Arc::new(MemoryTodoStore::new());
    create_app(AppState::new(Settings::default(), store))
}

fn flaky_app(store: Arc<FlakyStore>, cooldown: Duration) -> Router {
    let breaker = CircuitBreaker::with_config(CircuitBreakerConfig {
        name: "test-db".to_string(),
        max_requests: 1,
        interval: Duration::from_secs(60),
        timeout: cooldown,
        trip: TripPolicy {
            min_requests: 3,
            failure_ratio: 0.6,
        },
    });
    create_app(AppState::with_breaker(
        Settings::default(),
        store,
        Arc::new(breaker),
    ))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_todo_lifecycle() {
    let app = memory_app();

    // Starts empty
    let (status, body) = send_json(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    // Create
    let (status, body) = send_json(&app, Method::POST, "/todos", Some(json!({"task": "buy milk"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"id": 1, "task": "buy milk", "completed": false}));

    let (status, _) = send_json(&app, Method::POST, "/todos", Some(json!({"task": "walk dog"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    // Update
    let (status, bytes) = send(&app, Method::PUT, "/todos/1", Some(json!({"completed": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.is_empty());

    let (_, body) = send_json(&app, Method::GET, "/todos", None).await;
    assert_eq!(
        body,
        json!([
            {"id": 1, "task": "buy milk", "completed": true},
            {"id": 2, "task": "walk dog", "completed": false}
        ])
    );

    // Delete
    let (status, bytes) = send(&app, Method::DELETE, "/todos/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(bytes.is_empty());

    let (_, body) = send_json(&app, Method::GET, "/todos", None).await;
    assert_eq!(body, json!([{"id": 2, "task": "walk dog", "completed": false}]));
}

#[tokio::test]
async fn test_create_ignores_client_supplied_fields() {
    let app = memory_app();

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/todos",
        Some(json!({"id": 99, "task": "read", "completed": true})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"id": 1, "task": "read", "completed": false}));
}

#[tokio::test]
async fn test_missing_ids_are_not_errors() {
    let app = memory_app();

    let (status, _) = send(&app, Method::PUT, "/todos/42", Some(json!({"completed": true}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::DELETE, "/todos/42", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_invalid_ids_rejected() {
    let app = memory_app();

    for id in ["abc", "1.5", "-1", "0", "99999999999"] {
        let (status, body) = send_json(&app, Method::DELETE, &format!("/todos/{}", id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "id {}", id);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(&app, Method::PUT, &format!("/todos/{}", id), Some(json!({"completed": true}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "id {}", id);
    }
}

#[tokio::test]
async fn test_invalid_bodies_rejected() {
    let app = memory_app();

    let (status, body) = send_json(&app, Method::POST, "/todos", Some(json!({"task": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send(&app, Method::POST, "/todos", Some(json!({"title": "wrong field"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::PUT, "/todos/1", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/todos")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was stored
    let (_, body) = send_json(&app, Method::GET, "/todos", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_unsupported_method() {
    let app = memory_app();

    let (status, _) = send(&app, Method::PATCH, "/todos", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = memory_app();

    for (method, uri) in [
        (Method::GET, "/todos"),
        (Method::DELETE, "/todos/abc"),
        (Method::GET, "/does-not-exist"),
    ] {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let headers = response.headers();

        assert_eq!(headers["x-content-type-options"], "nosniff", "{}", uri);
        assert_eq!(headers["x-frame-options"], "DENY", "{}", uri);
        assert_eq!(headers["x-xss-protection"], "1; mode=block", "{}", uri);
        assert!(headers["content-security-policy"]
            .to_str()
            .unwrap()
            .starts_with("default-src 'self'"));
    }
}

#[tokio::test]
async fn test_healthz() {
    let app = memory_app();
    let (status, bytes) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"OK");

    let store = Arc::new(FlakyStore::new(true));
    let app = flaky_app(store, Duration::from_secs(30));
    let (status, bytes) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8(bytes).unwrap().starts_with("Database connection failed"));
}

#[tokio::test]
async fn test_breaker_opens_after_store_failures() {
    let store = Arc::new(FlakyStore::new(true));
    let app = flaky_app(store.clone(), Duration::from_secs(30));

    // Two failures: below min_requests, still closed
    for _ in 0..2 {
        let (status, body) = send_json(&app, Method::GET, "/todos", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "STORE_ERROR");
    }

    // Invalid input never reaches the breaker
    for _ in 0..5 {
        let (status, _) = send(&app, Method::DELETE, "/todos/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    assert_eq!(store.calls(), 2);

    // Third failure trips it
    let (status, _) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.calls(), 3);

    // Now calls are refused without touching the store
    let (status, body) = send_json(&app, Method::POST, "/todos", Some(json!({"task": "x"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "CIRCUIT_OPEN");
    assert_eq!(store.calls(), 3);

    let (status, stats) = send_json(&app, Method::GET, "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["circuit_breaker"]["name"], "test-db");
    assert_eq!(stats["circuit_breaker"]["state"], "open");
    assert_eq!(stats["store"]["backend"], "flaky");
}

#[tokio::test]
async fn test_breaker_recovers_after_cooldown() {
    let store = Arc::new(FlakyStore::new(true));
    let app = flaky_app(store.clone(), Duration::from_millis(50));

    for _ in 0..3 {
        send(&app, Method::GET, "/todos", None).await;
    }
    let (status, _) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    store.failing.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(80)).await;

    // Trial call succeeds and closes the circuit
    let (status, _) = send(&app, Method::POST, "/todos", Some(json!({"task": "back"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": 1, "task": "back", "completed": false}]));

    let (_, stats) = send_json(&app, Method::GET, "/stats", None).await;
    assert_eq!(stats["circuit_breaker"]["state"], "closed");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = memory_app();
    send(&app, Method::GET, "/todos", None).await;

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("todo_http_requests_total"));
    assert!(text.contains("todo_circuit_breaker_state"));
}
