//! HTTP client for an OpenAI-compatible chat-completions service.
//!
//! [`CompletionApi`] implements the core
//! [`CompletionGateway`](patrimoni_core::completion::CompletionGateway) trait.

pub mod api;
pub mod config;

pub use api::CompletionApi;
pub use config::CompletionConfig;
