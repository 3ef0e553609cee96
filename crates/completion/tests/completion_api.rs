//! Tests for [`CompletionApi`] against a local stand-in service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use patrimoni_completion::{CompletionApi, CompletionConfig};
use patrimoni_core::completion::{CompletionError, CompletionGateway};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct Captured {
    body: Arc<Mutex<Option<Value>>>,
    authorization: Arc<Mutex<Option<String>>>,
}

/// Serve `router` on an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1")
}

fn client(api_url: String, timeout: Duration) -> CompletionApi {
    CompletionApi::new(CompletionConfig {
        api_url,
        api_key: "secret".into(),
        model: "test-model".into(),
        timeout,
    })
    .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sends_prompt_and_returns_first_choice() {
    let captured = Captured::default();
    let router = Router::new()
        .route(
            "/v1/chat/completions",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    *captured.body.lock().unwrap() = Some(body);
                    *captured.authorization.lock().unwrap() = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_owned);
                    Json(json!({
                        "choices": [{"message": {"role": "assistant", "content": "SELECT 1"}}]
                    }))
                },
            ),
        )
        .with_state(captured.clone());
    let api = client(serve(router).await, Duration::from_secs(5));

    let text = api.complete("How many doors?").await.unwrap();

    assert_eq!(text, "SELECT 1");
    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["temperature"], 0.0);
    assert_eq!(body["messages"][0]["content"], "How many doors?");
    assert_eq!(
        captured.authorization.lock().unwrap().as_deref(),
        Some("Bearer secret")
    );
}

#[tokio::test]
async fn test_non_success_status_is_an_api_error() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let api = client(serve(router).await, Duration::from_secs(5));

    let err = api.complete("q").await.unwrap_err();
    assert_matches!(err, CompletionError::Api { status: 429, ref body } if body == "slow down");
}

#[tokio::test]
async fn test_empty_choice_is_an_error() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({"choices": []})) }),
    );
    let api = client(serve(router).await, Duration::from_secs(5));

    assert_matches!(api.complete("q").await, Err(CompletionError::EmptyCompletion));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"choices": [{"message": {"content": "SELECT 1"}}]}))
        }),
    );
    let api = client(serve(router).await, Duration::from_millis(200));

    assert_matches!(api.complete("q").await, Err(CompletionError::Timeout { .. }));
}

#[tokio::test]
async fn test_unreachable_service_is_a_request_error() {
    // Bind and drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(format!("http://{addr}/v1"), Duration::from_secs(2));
    assert_matches!(api.complete("q").await, Err(CompletionError::Request(_)));
}
