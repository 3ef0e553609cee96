//! Boundary to the external text-completion service.
//!
//! The registry only needs "prompt in, text out"; model choice, retries and
//! rate limiting belong to the implementation behind the trait.

use async_trait::async_trait;

/// Errors a completion backend can surface.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// The request never produced a response (network, DNS, TLS, ...).
    #[error("Completion request failed: {0}")]
    Request(String),

    /// The service answered with a non-2xx status.
    #[error("Completion service error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The service answered but returned no usable text.
    #[error("Completion service returned an empty completion")]
    EmptyCompletion,

    /// No answer within the configured deadline.
    #[error("Completion service timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// A text-completion capability: one prompt, one plain-text answer.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
