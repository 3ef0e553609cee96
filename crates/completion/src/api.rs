//! REST client for the chat-completions endpoint.
//!
//! Sends the whole prompt as a single user message with temperature 0 and
//! returns the first choice's text.

use async_trait::async_trait;
use patrimoni_core::completion::{CompletionError, CompletionGateway};
use serde::{Deserialize, Serialize};

use crate::config::CompletionConfig;

/// HTTP client for one completion service.
pub struct CompletionApi {
    client: reqwest::Client,
    config: CompletionConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// The parts of a chat-completions response the registry reads.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if it has any non-blank content.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
    }
}

impl CompletionApi {
    /// Build a client whose requests are bounded by `config.timeout`.
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Request(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: CompletionConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    async fn request(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.config.model,
            temperature: 0.0,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self
            .client
            .post(self.config.chat_completions_url())
            .json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request.send().await.map_err(|e| self.map_reqwest(e))?;
        let response = Self::ensure_success(response).await?;
        let parsed: ChatResponse = response.json().await.map_err(|e| self.map_reqwest(e))?;
        parsed.into_text().ok_or(CompletionError::EmptyCompletion)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, or surface the status
    /// and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, CompletionError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    fn map_reqwest(&self, err: reqwest::Error) -> CompletionError {
        if err.is_timeout() {
            CompletionError::Timeout {
                secs: self.config.timeout.as_secs(),
            }
        } else {
            CompletionError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl CompletionGateway for CompletionApi {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let deadline = self.config.timeout;
        let result = match tokio::time::timeout(deadline, self.request(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout {
                secs: deadline.as_secs(),
            }),
        };

        if let Err(e) = &result {
            tracing::warn!(model = %self.config.model, error = %e, "Completion call failed");
        }
        result
    }
}
