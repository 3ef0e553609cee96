#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use patrimoni_api::config::ServerConfig;
use patrimoni_api::router::build_app_router;
use patrimoni_api::state::AppState;
use patrimoni_completion::CompletionConfig;
use patrimoni_core::completion::{CompletionError, CompletionGateway};
use patrimoni_core::normalizer::{Normalizer, SynonymTable};
use patrimoni_core::sql_guard::SqlPolicy;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        query_timeout_secs: 5,
        synonyms_path: None,
        completion: CompletionConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            api_key: String::new(),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
        },
    }
}

/// What the fake completion service answers.
#[derive(Debug, Clone)]
pub enum CannedCompletion {
    Text(String),
    Timeout,
    ApiError(u16),
}

/// Completion double that records every prompt it receives.
#[derive(Debug)]
pub struct RecordingGateway {
    answer: CannedCompletion,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGateway {
    pub fn answering(sql: &str) -> Arc<Self> {
        Self::with(CannedCompletion::Text(sql.to_string()))
    }

    pub fn with(answer: CannedCompletion) -> Arc<Self> {
        Arc::new(Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionGateway for RecordingGateway {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.answer {
            CannedCompletion::Text(text) => Ok(text.clone()),
            CannedCompletion::Timeout => Err(CompletionError::Timeout { secs: 5 }),
            CannedCompletion::ApiError(status) => Err(CompletionError::Api {
                status: *status,
                body: "upstream failure".to_string(),
            }),
        }
    }
}

/// Build the full application router with the given completion double.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app_with(pool: PgPool, gateway: Arc<RecordingGateway>) -> Router {
    let config = test_config();
    let normalizer = Normalizer::new(SynonymTable::builtin()).unwrap();

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        normalizer: Arc::new(normalizer),
        sql_policy: Arc::new(SqlPolicy::default()),
        completion: gateway,
    };

    build_app_router(state, &config)
}

/// Router whose completion double always answers `SELECT 1`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, RecordingGateway::answering("SELECT 1"))
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, &body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
