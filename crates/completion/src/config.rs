use std::time::Duration;

/// Connection settings for the completion service.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`. `/chat/completions` is
    /// appended.
    pub api_url: String,
    /// Bearer token. Empty means no `Authorization` header.
    pub api_key: String,
    pub model: String,
    /// Upper bound for one completion call.
    pub timeout: Duration,
}

impl CompletionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                     |
    /// |---------------------------|-----------------------------|
    /// | `COMPLETION_API_URL`      | `https://api.openai.com/v1` |
    /// | `COMPLETION_API_KEY`      | empty                       |
    /// | `COMPLETION_MODEL`        | `gpt-4o-mini`               |
    /// | `COMPLETION_TIMEOUT_SECS` | `30`                        |
    pub fn from_env() -> Self {
        let api_url = std::env::var("COMPLETION_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let api_key = std::env::var("COMPLETION_API_KEY").unwrap_or_default();
        let model = std::env::var("COMPLETION_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

        let timeout_secs: u64 = std::env::var("COMPLETION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("COMPLETION_TIMEOUT_SECS must be a valid u64");

        Self {
            api_url,
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}
