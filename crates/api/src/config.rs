use patrimoni_completion::CompletionConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`).
    pub request_timeout_secs: u64,
    /// `statement_timeout` for generated queries, in seconds (default: `10`).
    pub query_timeout_secs: u64,
    /// JSON synonym table; the built-in table is used when unset.
    pub synonyms_path: Option<String>,
    /// Completion service settings.
    pub completion: CompletionConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `60`                       |
    /// | `QUERY_TIMEOUT_SECS`   | `10`                       |
    /// | `SYNONYMS_PATH`        | unset                      |
    ///
    /// Completion settings are read by [`CompletionConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let query_timeout_secs: u64 = std::env::var("QUERY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("QUERY_TIMEOUT_SECS must be a valid u64");

        let synonyms_path = std::env::var("SYNONYMS_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            query_timeout_secs,
            synonyms_path,
            completion: CompletionConfig::from_env(),
        }
    }
}
